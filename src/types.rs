//! The MPPL type system: a closed set of type shapes, interned by structure
//! so that two occurrences of the same shape (e.g. `array[3] of integer`
//! written twice) share one `TypeId` and type equality downstream becomes an
//! integer comparison.
//!
//! Structural interning is grounded on `spec.md` §4.1's third hopscotch
//! strategy ("structural type equality... recurses into `Array.base` and
//! `Proc.params`"): since children are interned before their parent, the
//! parent's equality check only ever compares already-canonical ids, so no
//! recursive structural walk is needed at lookup time.

use crate::interner::{fnv1a, HopscotchTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

/// The type shapes named in the data model. `String` exists only as the
/// type of a string-literal expression and is never the declared type of a
/// storage location (`StandardType` below enforces that at the type level
/// for code that must exclude it).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TypeData {
    Integer,
    Boolean,
    Char,
    String,
    Array { base: TypeId, length: u32 },
    Proc { params: Vec<TypeId> },
}

fn hash_type_data(data: &TypeData) -> u64 {
    let mut bytes = Vec::new();
    match data {
        TypeData::Integer => bytes.push(0u8),
        TypeData::Boolean => bytes.push(1),
        TypeData::Char => bytes.push(2),
        TypeData::String => bytes.push(3),
        TypeData::Array { base, length } => {
            bytes.push(4);
            bytes.extend_from_slice(&base.0.to_le_bytes());
            bytes.extend_from_slice(&length.to_le_bytes());
        }
        TypeData::Proc { params } => {
            bytes.push(5);
            for p in params {
                bytes.extend_from_slice(&p.0.to_le_bytes());
            }
        }
    }
    fnv1a(&bytes)
}

/// Structural interner for `TypeData`. Mirrors `StringInterner`'s
/// arena-plus-hopscotch-index shape; see `interner.rs` for why the lookup
/// and insertion live as inherent methods on `HopscotchTable<u32, _>` rather
/// than through the generic `hash`/`eq` fields.
pub struct TypeTable {
    arena: Vec<TypeData>,
    index: HopscotchTable<u32, ()>,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable {
            arena: Vec::new(),
            index: HopscotchTable::new(|_| 0, |_, _| false),
        }
    }

    fn intern_data(&mut self, data: TypeData) -> TypeId {
        let hash = hash_type_data(&data);
        if let Some(id) = self
            .index
            .find_hashed_pub(hash, |&id| self.arena[id as usize] == data)
        {
            return TypeId(id);
        }
        let id = self.arena.len() as u32;
        self.arena.push(data);
        self.index.insert_hashed_pub(hash, id);
        TypeId(id)
    }

    pub fn integer(&mut self) -> TypeId {
        self.intern_data(TypeData::Integer)
    }

    pub fn boolean(&mut self) -> TypeId {
        self.intern_data(TypeData::Boolean)
    }

    pub fn char(&mut self) -> TypeId {
        self.intern_data(TypeData::Char)
    }

    pub fn string(&mut self) -> TypeId {
        self.intern_data(TypeData::String)
    }

    pub fn array(&mut self, base: TypeId, length: u32) -> TypeId {
        self.intern_data(TypeData::Array { base, length })
    }

    pub fn proc(&mut self, params: Vec<TypeId>) -> TypeId {
        self.intern_data(TypeData::Proc { params })
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        self.arena[id.0 as usize] == TypeData::Integer
    }

    pub fn is_boolean(&self, id: TypeId) -> bool {
        self.arena[id.0 as usize] == TypeData::Boolean
    }

    pub fn is_char(&self, id: TypeId) -> bool {
        self.arena[id.0 as usize] == TypeData::Char
    }

    pub fn is_string(&self, id: TypeId) -> bool {
        self.arena[id.0 as usize] == TypeData::String
    }

    /// Integer, Boolean, and Char are the "standard types" (`spec.md` §3);
    /// `String` and array/proc types are not.
    pub fn is_standard(&self, id: TypeId) -> bool {
        matches!(
            self.arena[id.0 as usize],
            TypeData::Integer | TypeData::Boolean | TypeData::Char
        )
    }

    pub fn array_parts(&self, id: TypeId) -> Option<(TypeId, u32)> {
        match self.arena[id.0 as usize] {
            TypeData::Array { base, length } => Some((base, length)),
            _ => None,
        }
    }

    pub fn proc_params(&self, id: TypeId) -> Option<&[TypeId]> {
        match &self.arena[id.0 as usize] {
            TypeData::Proc { params } => Some(params),
            _ => None,
        }
    }

    pub fn is_proc(&self, id: TypeId) -> bool {
        matches!(self.arena[id.0 as usize], TypeData::Proc { .. })
    }

    /// A human-readable rendering for diagnostics, e.g. `array[3] of integer`.
    pub fn display(&self, id: TypeId) -> String {
        match &self.arena[id.0 as usize] {
            TypeData::Integer => "integer".to_string(),
            TypeData::Boolean => "boolean".to_string(),
            TypeData::Char => "char".to_string(),
            TypeData::String => "string".to_string(),
            TypeData::Array { base, length } => {
                format!("array[{length}] of {}", self.display(*base))
            }
            TypeData::Proc { params } => {
                let parts: Vec<_> = params.iter().map(|p| self.display(*p)).collect();
                format!("procedure({})", parts.join(", "))
            }
        }
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapper guaranteeing the contained `TypeId` is a standard type (Integer,
/// Boolean, or Char), used where the checker must reject `String` and array
/// element types at construction rather than re-checking at every call site
/// (`spec.md` §9's `IR_TYPE_STRING` Open Question: the checker constructs
/// one of these the moment it knows a place is writable, so downstream code
/// that only accepts `StandardType` can never be handed a `String`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardType(TypeId);

impl StandardType {
    pub fn new(types: &TypeTable, id: TypeId) -> Option<StandardType> {
        if types.is_standard(id) {
            Some(StandardType(id))
        } else {
            None
        }
    }

    pub fn type_id(self) -> TypeId {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_types_intern_to_stable_ids() {
        let mut types = TypeTable::new();
        assert_eq!(types.integer(), types.integer());
        assert_ne!(types.integer(), types.boolean());
    }

    #[test]
    fn array_types_intern_by_structure() {
        let mut types = TypeTable::new();
        let int_ty = types.integer();
        let a = types.array(int_ty, 3);
        let b = types.array(int_ty, 3);
        let c = types.array(int_ty, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn proc_types_intern_by_param_list() {
        let mut types = TypeTable::new();
        let int_ty = types.integer();
        let bool_ty = types.boolean();
        let p1 = types.proc(vec![int_ty, bool_ty]);
        let p2 = types.proc(vec![int_ty, bool_ty]);
        let p3 = types.proc(vec![bool_ty, int_ty]);
        assert_eq!(p1, p2);
        assert_ne!(p1, p3);
    }

    #[test]
    fn standard_type_excludes_string_and_array() {
        let mut types = TypeTable::new();
        let string_ty = types.string();
        let int_ty = types.integer();
        let arr_ty = types.array(int_ty, 2);
        assert!(StandardType::new(&types, string_ty).is_none());
        assert!(StandardType::new(&types, arr_ty).is_none());
        assert!(StandardType::new(&types, int_ty).is_some());
    }

    #[test]
    fn display_renders_nested_array_types() {
        let mut types = TypeTable::new();
        let int_ty = types.integer();
        let arr_ty = types.array(int_ty, 5);
        assert_eq!(types.display(arr_ty), "array[5] of integer");
    }
}
