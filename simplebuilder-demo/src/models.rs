use crate::simple_builder_gen::GenerateBuilder;

#[derive(Debug, Clone, PartialEq, GenerateBuilder)]
pub struct Person {
    pub name: String,
    pub age: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
}

/// A customer record; `manager` points at another customer.
#[derive(Debug, Clone, PartialEq, GenerateBuilder)]
pub struct Customer {
    pub name: String,
    pub address: Address,
    pub tags: Vec<Option<String>>,
    pub r#type: String,
    pub manager: Option<Box<Self>>,
}

#[derive(Debug, Clone, PartialEq, GenerateBuilder)]
pub struct Settings {
    secret: String,
}

impl Settings {
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            secret: "hunter2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, GenerateBuilder)]
pub struct Empty;

#[derive(Debug, Clone, Default, PartialEq, GenerateBuilder)]
pub struct Account {
    pub owner: String,
    pub balance: i64,
    audit_id: u64,
}

impl Account {
    pub fn audit_id(&self) -> u64 {
        self.audit_id
    }
}

// Tuple fields have no names to derive setters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, GenerateBuilder)]
pub struct Pair(pub u32, pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub title: String,
}
