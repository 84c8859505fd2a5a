pub mod destination;
pub mod error;
pub mod event;
pub mod import;
pub mod payload;
pub mod plan;
pub mod response;
pub mod settings;
pub mod transport;
pub mod ua;
pub mod validate;
pub mod value;

pub use destination::Mixpanel;
pub use error::MixpanelError;
pub use error::Result;
pub use event::Alias;
pub use event::Group;
pub use event::Identify;
pub use event::PageView;
pub use event::Surface;
pub use event::Track;
pub use settings::Settings;
pub use value::PropValue;
pub use value::Props;
