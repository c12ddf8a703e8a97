pub mod details;
pub mod menu;
pub mod search;
pub mod widgets;

pub use details::{render_anime_details, render_manga_details};
pub use menu::render_menu_view;
pub use search::render_search_view;
