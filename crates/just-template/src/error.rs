use just_dom::DomError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown strategy for '{element}' with '{strategy}'")]
    UnknownStrategy { element: String, strategy: String },

    #[error("strategy '{strategy}' failed on '{element}': {message}")]
    Strategy {
        element: String,
        strategy: String,
        message: String,
    },

    #[error(transparent)]
    Dom(#[from] DomError),
}
