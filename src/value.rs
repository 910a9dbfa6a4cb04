//! Self-describing values decoded from event payloads.
//!
//! Payload decoding produces a tree of [`Value`]s: scalars and strings at
//! the leaves, [`StructValue`] and [`ArrayValue`] as the containers. The
//! tree is owned by its containing struct, array, or event; consumers only
//! ever receive borrows. Equality is deep, and for structs it is sensitive
//! to field order.

/// A single decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed 8-bit integer.
    Char(i8),
    /// Unsigned 8-bit integer.
    UChar(u8),
    /// Signed 16-bit integer.
    Short(i16),
    /// Unsigned 16-bit integer.
    UShort(u16),
    /// Signed 32-bit integer.
    Int(i32),
    /// Unsigned 32-bit integer.
    UInt(u32),
    /// Signed 64-bit integer.
    Long(i64),
    /// Unsigned 64-bit integer.
    ULong(u64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Narrow (byte) string.
    Str(String),
    /// Wide (UTF-16 on the wire) string, re-encoded as UTF-8.
    WStr(String),
    /// Ordered sequence of named fields.
    Struct(StructValue),
    /// Homogeneous ordered sequence of values.
    Array(ArrayValue),
}

impl Value {
    /// Widens any unsigned integer value to a `u64`.
    ///
    /// 32-bit addresses decoded from 32-bit payloads widen losslessly, so
    /// consumers can treat pointer-typed fields uniformly.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UChar(v) => Some(u64::from(*v)),
            Self::UShort(v) => Some(u64::from(*v)),
            Self::UInt(v) => Some(u64::from(*v)),
            Self::ULong(v) => Some(*v),
            _ => None,
        }
    }

    /// Widens unsigned integer values up to 32 bits to a `u32`.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UChar(v) => Some(u32::from(*v)),
            Self::UShort(v) => Some(u32::from(*v)),
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value of a signed 32-bit integer.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text of a narrow string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the text of a wide string value.
    pub fn as_wstr(&self) -> Option<&str> {
        match self {
            Self::WStr(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Self::Struct(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }
}

/// An ordered sequence of `(name, value)` pairs.
///
/// Field order is insertion order and is significant for equality.
/// Duplicate names are permitted; lookup returns the first match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field. Existing fields with the same name are kept.
    pub fn add_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    /// Returns the first field named `name`, if any.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn field_as_u64(&self, name: &str) -> Option<u64> {
        self.field(name)?.as_u64()
    }

    pub fn field_as_u32(&self, name: &str) -> Option<u32> {
        self.field(name)?.as_u32()
    }

    pub fn field_as_i32(&self, name: &str) -> Option<i32> {
        self.field(name)?.as_i32()
    }

    pub fn field_as_str(&self, name: &str) -> Option<&str> {
        self.field(name)?.as_str()
    }

    pub fn field_as_wstr(&self, name: &str) -> Option<&str> {
        self.field(name)?.as_wstr()
    }

    pub fn field_as_struct(&self, name: &str) -> Option<&StructValue> {
        self.field(name)?.as_struct()
    }

    pub fn field_as_array(&self, name: &str) -> Option<&ArrayValue> {
        self.field(name)?.as_array()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// A homogeneous ordered sequence of values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayValue {
    values: Vec<Value>,
}

impl ArrayValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_widening() {
        assert_eq!(Value::UChar(0xAB).as_u64(), Some(0xAB));
        assert_eq!(Value::UShort(0xABCD).as_u64(), Some(0xABCD));
        assert_eq!(Value::UInt(0xABCD_EF01).as_u64(), Some(0xABCD_EF01));
        assert_eq!(Value::ULong(u64::MAX).as_u64(), Some(u64::MAX));

        // Signed kinds never widen through the unsigned accessor.
        assert_eq!(Value::Int(-1).as_u64(), None);
        assert_eq!(Value::Long(-1).as_u64(), None);
        assert_eq!(Value::Str("12".into()).as_u64(), None);

        assert_eq!(Value::ULong(1).as_u32(), None);
        assert_eq!(Value::UShort(12).as_u32(), Some(12));
    }

    #[test]
    fn struct_lookup_first_match_wins() {
        let mut fields = StructValue::new();
        fields.add_field("Status", Value::UInt(0));
        fields.add_field("Status", Value::UInt(5));
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.field_as_u32("Status"), Some(0));
        assert_eq!(fields.field("Missing"), None);
    }

    #[test]
    fn struct_accessors_reject_wrong_kind() {
        let mut fields = StructValue::new();
        fields.add_field("Name", Value::WStr("ntdll.dll".into()));
        fields.add_field("Size", Value::UInt(64));
        assert_eq!(fields.field_as_wstr("Name"), Some("ntdll.dll"));
        assert_eq!(fields.field_as_str("Name"), None);
        assert_eq!(fields.field_as_u64("Name"), None);
        assert_eq!(fields.field_as_array("Size"), None);
    }

    #[test]
    fn deep_equality_is_order_sensitive() {
        let mut a = StructValue::new();
        a.add_field("x", Value::UInt(1));
        a.add_field("y", Value::UInt(2));

        let mut b = StructValue::new();
        b.add_field("y", Value::UInt(2));
        b.add_field("x", Value::UInt(1));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn deep_equality_recurses_into_containers() {
        let mut inner = ArrayValue::new();
        inner.append(Value::UChar(1));
        inner.append(Value::UChar(2));

        let mut a = StructValue::new();
        a.add_field("Sid", Value::Array(inner.clone()));

        let mut b = StructValue::new();
        b.add_field("Sid", Value::Array(inner.clone()));
        assert_eq!(a, b);

        let mut longer = inner.clone();
        longer.append(Value::UChar(3));
        let mut c = StructValue::new();
        c.add_field("Sid", Value::Array(longer));
        assert_ne!(a, c);
    }
}
