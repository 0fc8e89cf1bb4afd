//! Typed endpoint helpers on [`HttpClient`](crate::HttpClient)
//!
//! Responses are returned as JSON; mapping them onto cached entities is
//! left to the caller.

mod channels;
mod gateway;
mod guilds;
mod messages;
mod users;

pub use channels::EditChannel;
pub use gateway::{gateway_url, BotGateway, SessionStartLimit, GATEWAY_VERSION};
pub use guilds::EditMember;
pub use messages::{CreateMessage, EditMessage, HistoryQuery, MessageReference, BULK_DELETE_MAX};
pub use users::{image_data_uri, EditProfile};
