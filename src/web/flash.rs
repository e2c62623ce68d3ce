//! One-shot admin notices carried across the post/redirect/get hop.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::ComicError;

const FLASH_KEY: &str = "admin_flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Flash {
    ComicDeleted(i32),
    ComicMissing(i32),
}

impl Flash {
    pub(crate) fn message(self) -> String {
        match self {
            Flash::ComicDeleted(id) => format!("Comic {id} and its images were deleted."),
            Flash::ComicMissing(id) => format!("Comic {id} no longer exists."),
        }
    }

    pub(crate) fn class(self) -> &'static str {
        match self {
            Flash::ComicDeleted(_) => "success",
            Flash::ComicMissing(_) => "warning",
        }
    }
}

pub(crate) async fn set_flash(session: &Session, flash: Flash) -> Result<(), ComicError> {
    Ok(session.insert(FLASH_KEY, flash).await?)
}

/// Returns the pending notice and clears it.
pub(crate) async fn take_flash(session: &Session) -> Result<Option<Flash>, ComicError> {
    Ok(session.remove::<Flash>(FLASH_KEY).await?)
}
