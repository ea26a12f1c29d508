//! Google OAuth credentials and the Sheets API client.
//!
//! [`ClientSecrets`] and [`AuthorizedUser`] are the `credentials.json` and
//! `token.json` files of the installed-app flow. [`oauth`] turns them into an
//! access token, and [`SheetsClient`] uses that token to implement
//! [`RecordSource`](crate::services::RecordSource) and
//! [`RecordSink`](crate::services::RecordSink).

mod credentials;
pub mod oauth;
mod sheets;

pub use credentials::{AuthorizedUser, ClientSecrets};
pub use sheets::{SHEETS_BASE_URL, SheetsClient};
