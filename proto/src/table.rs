use serde::{Deserialize, Serialize};

/// A row as it travels between the client and a store adapter: column name to json value
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Table {
    Storefronts,
    Categories,
    Images,
    Permissions,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Storefronts, Table::Categories, Table::Images, Table::Permissions];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Storefronts => "storefronts",
            Table::Categories => "storefront_categories",
            Table::Images => "storefront_images",
            Table::Permissions => "permissions",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> { Self::ALL.into_iter().find(|table| table.name() == name) }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.name()) }
}

/// Column and table names are interpolated into SQL, so only a narrow character set is accepted
pub fn sane_name(name: &str) -> bool { !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') }
