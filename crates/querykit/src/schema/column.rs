//! Column definitions and their modifiers.

use crate::value::Param;

/// Storage type of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Increments,
    BigIncrements,
    TinyInteger,
    SmallInteger,
    MediumInteger,
    Integer,
    BigInteger,
    Char(u32),
    String(u32),
    Text,
    MediumText,
    LongText,
    Boolean,
    Decimal(u8, u8),
    Float(u8, u8),
    Double(Option<(u8, u8)>),
    Date,
    DateTime,
    Time,
    Timestamp,
    Year,
    Json,
    Jsonb,
    Binary,
    Uuid,
    Enum(Vec<String>),
    IpAddress,
    MacAddress,
}

impl ColumnType {
    /// Integer family, the only types that can auto-increment.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::Increments
                | ColumnType::BigIncrements
                | ColumnType::TinyInteger
                | ColumnType::SmallInteger
                | ColumnType::MediumInteger
                | ColumnType::Integer
                | ColumnType::BigInteger
        )
    }
}

/// Column attribute rendered after the type, in a per-dialect order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Unsigned,
    Charset,
    Collate,
    VirtualAs,
    StoredAs,
    Nullable,
    Default,
    Increment,
    Comment,
    After,
    First,
}

/// Index created from a column's fluent shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
    SpatialIndex,
}

impl IndexKind {
    /// Suffix used in generated index names.
    pub fn suffix(self) -> &'static str {
        match self {
            IndexKind::Primary => "primary",
            IndexKind::Unique => "unique",
            IndexKind::Index => "index",
            IndexKind::SpatialIndex => "spatialindex",
        }
    }
}

/// One column of a [`Blueprint`](super::Blueprint).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    pub default: Option<Param>,
    pub unsigned: bool,
    pub auto_increment: bool,
    pub comment: Option<String>,
    pub after: Option<String>,
    pub first: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub use_current: bool,
    pub virtual_as: Option<String>,
    pub stored_as: Option<String>,
    /// Fluent index shorthands, with an optional explicit name.
    pub indexes: Vec<(IndexKind, Option<String>)>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default: None,
            unsigned: false,
            auto_increment: false,
            comment: None,
            after: None,
            first: false,
            charset: None,
            collation: None,
            use_current: false,
            virtual_as: None,
            stored_as: None,
            indexes: Vec::new(),
        }
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    pub fn default(&mut self, value: impl Into<Param>) -> &mut Self {
        self.default = Some(value.into());
        self
    }

    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    /// Place the column after `column` (MySQL).
    pub fn after(&mut self, column: impl Into<String>) -> &mut Self {
        self.after = Some(column.into());
        self
    }

    /// Place the column first (MySQL).
    pub fn first(&mut self) -> &mut Self {
        self.first = true;
        self
    }

    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn collation(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }

    /// Default a timestamp to `CURRENT_TIMESTAMP`.
    pub fn use_current(&mut self) -> &mut Self {
        self.use_current = true;
        self
    }

    pub fn virtual_as(&mut self, expression: impl Into<String>) -> &mut Self {
        self.virtual_as = Some(expression.into());
        self
    }

    pub fn stored_as(&mut self, expression: impl Into<String>) -> &mut Self {
        self.stored_as = Some(expression.into());
        self
    }

    pub fn primary(&mut self) -> &mut Self {
        self.indexes.push((IndexKind::Primary, None));
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.indexes.push((IndexKind::Unique, None));
        self
    }

    pub fn unique_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.indexes.push((IndexKind::Unique, Some(name.into())));
        self
    }

    pub fn index(&mut self) -> &mut Self {
        self.indexes.push((IndexKind::Index, None));
        self
    }

    pub fn index_named(&mut self, name: impl Into<String>) -> &mut Self {
        self.indexes.push((IndexKind::Index, Some(name.into())));
        self
    }

    pub fn spatial_index(&mut self) -> &mut Self {
        self.indexes.push((IndexKind::SpatialIndex, None));
        self
    }

    /// Generated columns take their value from an expression.
    pub fn is_generated(&self) -> bool {
        self.virtual_as.is_some() || self.stored_as.is_some()
    }
}
