pub mod header;
pub mod help_overlay;
pub mod now_playing;
pub mod search_bar;
pub mod station_details;
pub mod station_list;
