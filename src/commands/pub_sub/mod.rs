mod ping;
mod publish;
mod subscribe;

pub use ping::ping;
pub use publish::{publish, PublishArguments};
pub use subscribe::{subscribe, unsubscribe, SubscribeArguments};
