mod layout;
mod widgets;

pub use layout::render;
pub use widgets::{
    render_add_note,
    render_header,
    render_note_list,
    render_status_bar,
    render_summary,
    render_toasts,
};
