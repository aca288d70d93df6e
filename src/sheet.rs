//! An in-memory store of character sheets and the attribute holders bound to them.
//!
//! A holder (a user inside a group, a group, a user) can be bound to a
//! character sheet; evaluating against the holder then reads and writes the
//! character's attributes. The store is shared between chat sessions, so all
//! access goes through a lock, and evaluation itself runs on a
//! [`SheetContext`] snapshot without holding it.

use crate::context::Context;
use crate::vm::Value;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

pub type Attributes = HashMap<String, Value>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SheetKind {
    Character,
    GroupUser,
    Group,
    User,
}

impl SheetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::GroupUser => "group_user",
            Self::Group => "group",
            Self::User => "user",
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub id: String,
    pub kind: Option<SheetKind>,
    pub name: String,
    pub sheet_type: String,
    pub owner_id: String,
    /// Hidden sheets are left out of [`SheetStore::characters_of`].
    pub hidden: bool,
    /// For holders: the character this sheet currently reads through. Empty when unbound.
    pub binding_sheet_id: String,
    pub attrs: Attributes,
    created: u64,
}

impl Sheet {
    pub fn new(id: impl Into<String>, kind: SheetKind) -> Self {
        Self {
            id: id.into(),
            kind: Some(kind),
            name: String::new(),
            sheet_type: String::new(),
            owner_id: String::new(),
            hidden: false,
            binding_sheet_id: String::new(),
            attrs: Attributes::new(),
            created: 0,
        }
    }

    pub fn character(id: impl Into<String>, owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: name.into(),
            ..Self::new(id, SheetKind::Character)
        }
    }

    pub fn with_sheet_type(mut self, sheet_type: impl Into<String>) -> Self {
        self.sheet_type = sheet_type.into();
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn is_bound(&self) -> bool {
        !self.binding_sheet_id.is_empty()
    }

    // a fresh record written by `put`: hidden, unbound, untyped
    fn placeholder(id: &str, created: u64) -> Self {
        Self {
            id: id.to_string(),
            kind: None,
            name: String::new(),
            sheet_type: String::new(),
            owner_id: String::new(),
            hidden: true,
            binding_sheet_id: String::new(),
            attrs: Attributes::new(),
            created,
        }
    }
}

/// One entry of [`SheetStore::put_batch`].
#[derive(Debug, Clone, PartialEq)]
pub struct SheetUpsert {
    pub id: String,
    pub attrs: Attributes,
    pub name: String,
    pub sheet_type: String,
}

/// A visible character and how many holders are bound to it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CharacterSummary {
    pub id: String,
    pub name: String,
    pub sheet_type: String,
    pub binding_count: usize,
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum StoreError {
    #[error("no sheet with id {0:?}")]
    NotFound(String),
    #[error("sheet {0:?} already exists")]
    AlreadyExists(String),
    #[error("sheet {0:?} is not a character")]
    NotACharacter(String),
}

type SResult<T> = Result<T, StoreError>;

#[derive(Debug, Default)]
struct Inner {
    sheets: HashMap<String, Sheet>,
    // creation order; stands in for timestamps
    next_seq: u64,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn upsert(&mut self, id: &str, attrs: Attributes, name: &str, sheet_type: &str) {
        let seq = self.next_seq();
        let sheet = self
            .sheets
            .entry(id.to_string())
            .or_insert_with(|| Sheet::placeholder(id, seq));
        sheet.attrs = attrs;
        sheet.name = name.to_string();
        sheet.sheet_type = sheet_type.to_string();
    }
}

#[derive(Debug, Default)]
pub struct SheetStore {
    inner: RwLock<Inner>,
}

impl SheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    // a panic in another session must not lock everyone out of their sheets
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, id: &str) -> Option<Sheet> {
        self.read().sheets.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a new sheet. Fails if the id is taken.
    pub fn create(&self, mut sheet: Sheet) -> SResult<()> {
        let mut inner = self.write();
        if inner.sheets.contains_key(&sheet.id) {
            return Err(StoreError::AlreadyExists(sheet.id));
        }
        sheet.created = inner.next_seq();
        debug!("creating sheet {:?} ({:?})", sheet.id, sheet.kind);
        inner.sheets.insert(sheet.id.clone(), sheet);
        Ok(())
    }

    /// Replaces the attributes, name and type of a sheet, creating a hidden,
    /// unbound one if it does not exist yet.
    pub fn put(&self, id: &str, attrs: Attributes, name: &str, sheet_type: &str) {
        debug!("putting sheet {:?}", id);
        self.write().upsert(id, attrs, name, sheet_type);
    }

    /// [`put`](Self::put) for many sheets under one lock, so readers never
    /// see half a batch.
    pub fn put_batch(&self, batch: Vec<SheetUpsert>) {
        debug!("putting {} sheet(s)", batch.len());
        let mut inner = self.write();
        for item in batch {
            inner.upsert(&item.id, item.attrs, &item.name, &item.sheet_type);
        }
    }

    pub fn delete(&self, id: &str) -> bool {
        debug!("deleting sheet {:?}", id);
        self.write().sheets.remove(id).is_some()
    }

    /// Points `holder_id` at the character `char_id`, creating the holder if needed.
    pub fn bind(&self, char_id: &str, holder_id: &str) -> SResult<()> {
        let mut inner = self.write();
        match inner.sheets.get(char_id) {
            None => return Err(StoreError::NotFound(char_id.to_string())),
            Some(sheet) if sheet.kind != Some(SheetKind::Character) => {
                return Err(StoreError::NotACharacter(char_id.to_string()))
            }
            Some(_) => {}
        }

        debug!("binding {:?} to character {:?}", holder_id, char_id);
        let seq = inner.next_seq();
        let holder = inner
            .sheets
            .entry(holder_id.to_string())
            .or_insert_with(|| Sheet::placeholder(holder_id, seq));
        holder.binding_sheet_id = char_id.to_string();
        Ok(())
    }

    /// Unbinds every holder of `char_id`, returning how many there were.
    pub fn unbind_all(&self, char_id: &str) -> usize {
        let mut inner = self.write();
        let mut count = 0;
        for sheet in inner.sheets.values_mut() {
            if sheet.binding_sheet_id == char_id {
                sheet.binding_sheet_id.clear();
                count += 1;
            }
        }
        debug!("unbound {} holder(s) from {:?}", count, char_id);
        count
    }

    /// Holders bound to `char_id`, oldest first.
    pub fn binding_list(&self, char_id: &str) -> Vec<String> {
        let inner = self.read();
        let mut holders: Vec<&Sheet> = inner
            .sheets
            .values()
            .filter(|sheet| sheet.binding_sheet_id == char_id)
            .collect();
        holders.sort_by_key(|sheet| sheet.created);
        holders.into_iter().map(|sheet| sheet.id.clone()).collect()
    }

    /// The character `holder_id` is bound to, if any.
    pub fn binding_of(&self, holder_id: &str) -> Option<String> {
        self.read()
            .sheets
            .get(holder_id)
            .filter(|sheet| sheet.is_bound())
            .map(|sheet| sheet.binding_sheet_id.clone())
    }

    pub fn find_by_name(&self, owner_id: &str, name: &str) -> Option<String> {
        self.read()
            .sheets
            .values()
            .filter(|sheet| sheet.owner_id == owner_id && sheet.name == name)
            .min_by_key(|sheet| sheet.created)
            .map(|sheet| sheet.id.clone())
    }

    /// The visible sheets owned by `owner_id`, oldest first.
    pub fn characters_of(&self, owner_id: &str) -> Vec<CharacterSummary> {
        let inner = self.read();
        let mut owned: Vec<&Sheet> = inner
            .sheets
            .values()
            .filter(|sheet| sheet.owner_id == owner_id && !sheet.hidden)
            .collect();
        owned.sort_by_key(|sheet| sheet.created);

        owned
            .into_iter()
            .map(|sheet| CharacterSummary {
                id: sheet.id.clone(),
                name: sheet.name.clone(),
                sheet_type: sheet.sheet_type.clone(),
                binding_count: inner
                    .sheets
                    .values()
                    .filter(|other| other.binding_sheet_id == sheet.id)
                    .count(),
            })
            .collect()
    }

    /// Snapshots the attributes `id` evaluates against: its bound character's
    /// if it has one, its own otherwise.
    pub fn context(&self, id: &str) -> SheetContext {
        let inner = self.read();
        let target = inner
            .sheets
            .get(id)
            .filter(|sheet| sheet.is_bound() && inner.sheets.contains_key(&sheet.binding_sheet_id))
            .map_or(id, |sheet| sheet.binding_sheet_id.as_str());
        let attrs = inner
            .sheets
            .get(target)
            .map(|sheet| sheet.attrs.clone())
            .unwrap_or_default();

        SheetContext {
            target: target.to_string(),
            attrs,
            dirty: Vec::new(),
        }
    }

    /// Writes back what an evaluation assigned in `ctx`. Returns the number of
    /// attributes written.
    pub fn commit(&self, ctx: SheetContext) -> SResult<usize> {
        if ctx.dirty.is_empty() {
            return Ok(0);
        }
        let mut inner = self.write();
        let sheet = inner
            .sheets
            .get_mut(&ctx.target)
            .ok_or_else(|| StoreError::NotFound(ctx.target.clone()))?;

        let SheetContext { mut attrs, dirty, .. } = ctx;
        let count = dirty.len();
        for name in dirty {
            if let Some(value) = attrs.remove(&name) {
                sheet.attrs.insert(name, value);
            }
        }
        debug!("committed {} attribute(s) to {:?}", count, sheet.id);
        Ok(count)
    }
}

/// A detached copy of one sheet's attributes to evaluate against.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetContext {
    target: String,
    attrs: Attributes,
    dirty: Vec<String>,
}

impl SheetContext {
    /// The id of the sheet this context reads and commits to.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

impl Context for SheetContext {
    fn get(&self, name: &str) -> Option<Value> {
        self.attrs.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        if !self.dirty.iter().any(|dirty| dirty == name) {
            self.dirty.push(name.to_string());
        }
        self.attrs.insert(name.to_string(), value);
    }
}
