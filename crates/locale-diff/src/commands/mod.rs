mod convert;
mod run;
mod scope;

pub use convert::{convert_texture, ConvertTextureArgs};
pub use run::{run_locale_extraction, RunExtractionArgs};
pub use scope::{show_scope, ShowScopeArgs};
