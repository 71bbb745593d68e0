pub(crate) use crate::document::Document;
pub(crate) use crate::error::{DateprepError, DateprepResult, bail};
pub(crate) use crate::progress::ProgressBarBuilder;
pub(crate) use crate::project::Project;
pub(crate) use crate::store::Store;
