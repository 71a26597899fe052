pub mod document;

pub use document::{BoundingBox, Document, FormField, Line, Page, Table, TableRow};
