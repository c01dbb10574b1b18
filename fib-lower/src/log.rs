// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

macro_rules! sync_log {
    ($self:expr, $level:ident, $msg:expr; $($key:expr => $value:expr),*) => {
        slog::$level!($self.log,
            $msg;
            "component" => crate::COMPONENT_FIB_LOWER,
            "module" => crate::MOD_SYNC,
            "unit" => crate::UNIT_RECONCILER,
            $($key => $value),*
        )
    };
    ($self:expr, $level:ident, $msg:expr, $($args:expr),*; $($key:expr => $value:expr),*) => {
        slog::$level!($self.log,
            $msg, $($args),*;
            "component" => crate::COMPONENT_FIB_LOWER,
            "module" => crate::MOD_SYNC,
            "unit" => crate::UNIT_RECONCILER,
            $($key => $value),*
        )
    };
    ($self:expr, $level:ident, $msg:expr) => {
        slog::$level!($self.log,
            $msg;
            "component" => crate::COMPONENT_FIB_LOWER,
            "module" => crate::MOD_SYNC,
            "unit" => crate::UNIT_RECONCILER
        )
    };
    ($self:expr, $level:ident, $msg:expr, $($args:expr),*) => {
        slog::$level!($self.log,
            $msg, $($args),*;
            "component" => crate::COMPONENT_FIB_LOWER,
            "module" => crate::MOD_SYNC,
            "unit" => crate::UNIT_RECONCILER
        )
    };
}

macro_rules! store_log {
    ($self:expr, $level:ident, $msg:expr; $($key:expr => $value:expr),*) => {
        slog::$level!($self.log,
            $msg;
            "component" => crate::COMPONENT_FIB_LOWER,
            "module" => crate::MOD_SYNC,
            "unit" => crate::UNIT_STORE,
            $($key => $value),*
        )
    };
    ($self:expr, $level:ident, $msg:expr, $($args:expr),*; $($key:expr => $value:expr),*) => {
        slog::$level!($self.log,
            $msg, $($args),*;
            "component" => crate::COMPONENT_FIB_LOWER,
            "module" => crate::MOD_SYNC,
            "unit" => crate::UNIT_STORE,
            $($key => $value),*
        )
    };
    ($self:expr, $level:ident, $msg:expr) => {
        slog::$level!($self.log,
            $msg;
            "component" => crate::COMPONENT_FIB_LOWER,
            "module" => crate::MOD_SYNC,
            "unit" => crate::UNIT_STORE
        )
    };
    ($self:expr, $level:ident, $msg:expr, $($args:expr),*) => {
        slog::$level!($self.log,
            $msg, $($args),*;
            "component" => crate::COMPONENT_FIB_LOWER,
            "module" => crate::MOD_SYNC,
            "unit" => crate::UNIT_STORE
        )
    };
}

pub(crate) use store_log;
pub(crate) use sync_log;
