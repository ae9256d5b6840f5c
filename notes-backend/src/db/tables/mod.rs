//! Table operations - each module contains `impl Database` blocks for one table.

mod folders;
mod note_items;
mod note_references;
mod notes;
mod users;
