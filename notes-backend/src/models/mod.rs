mod folder;
mod note;
mod note_item;
mod note_reference;
mod user;

pub use folder::Folder;
pub use note::Note;
pub use note_item::NoteItem;
pub use note_reference::NoteReference;
pub use user::User;
