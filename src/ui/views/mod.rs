mod admin_board;
mod admin_login;
mod lookup;
mod record_detail;
mod submit;

pub use admin_board::AdminBoardView;
pub use admin_login::AdminLoginView;
pub use lookup::LookupView;
pub use record_detail::RecordDetailView;
pub use submit::SubmitView;
