mod fetch;
mod query;
mod render;
mod state;
mod timers;
mod view;

pub use query::{BoardQuery, StatusFilter};
pub use render::{render_board, render_entry};
pub use state::{BoardData, BoardEntry, CtfBoard, RefreshTicket};
pub use view::{ActionError, BoardHandle, BoardSettings, BoardSnapshot, BoardView};
