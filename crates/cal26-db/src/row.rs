//! Typed rows produced by [`crate::Database`] queries.
//!
//! Rows are decoded into Rust types through [`FromRow`] instead of being
//! handed out as untyped column maps. Tuples decode positionally; structs
//! declared with [`record!`](crate::record) decode by column name.

use rusqlite::Row;
use rusqlite::types::FromSql;

/// Decode one result row into `Self`.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

macro_rules! tuple_from_row {
    ($($idx:tt => $ty:ident),+) => {
        impl<$($ty: FromSql),+> FromRow for ($($ty,)+) {
            fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
                Ok(($(row.get::<usize, $ty>($idx)?,)+))
            }
        }
    };
}

tuple_from_row!(0 => A);
tuple_from_row!(0 => A, 1 => B);
tuple_from_row!(0 => A, 1 => B, 2 => C);
tuple_from_row!(0 => A, 1 => B, 2 => C, 3 => D);

/// Declare a struct whose fields are read from the columns of the same name.
///
/// ```
/// cal26_db::record! {
///     #[derive(Debug)]
///     pub struct UserRow {
///         pub id: String,
///         pub email: String,
///         pub is_staff: bool,
///     }
/// }
/// ```
///
/// The query feeding it must select (or alias) every field by name; a missing
/// column surfaces as `rusqlite::Error::InvalidColumnName`.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field : $ty ),*
        }

        impl $crate::row::FromRow for $name {
            fn from_row(row: &$crate::rusqlite::Row<'_>) -> $crate::rusqlite::Result<Self> {
                Ok(Self {
                    $( $field: row.get(stringify!($field))? ),*
                })
            }
        }
    };
}
