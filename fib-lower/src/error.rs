// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::platform::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("store error {0}")]
    Store(#[from] StoreError),

    #[error("store {0} timed out")]
    StoreTimeout(&'static str),

    #[error("event channel closed: {0}")]
    Channel(String),
}
