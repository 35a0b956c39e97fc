pub mod area_toc;
pub mod common;
pub mod isrc_genre;
pub mod master_toc;
pub mod text;
pub mod track_list;
