use crate::{
    storage::varint,
    types::{
        RowId,
        error::{DatabaseError, Result},
        page::LeafCell,
        value::Value,
    },
};

/// Per-field type tag from a record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    Float64,
    ConstantZero,
    ConstantOne,
    Blob(usize),
    Text(usize),
}

impl SerialType {
    pub fn from_u64(value: u64) -> Result<Self> {
        match value {
            0 => Ok(SerialType::Null),
            1 => Ok(SerialType::Int8),
            2 => Ok(SerialType::Int16),
            3 => Ok(SerialType::Int24),
            4 => Ok(SerialType::Int32),
            5 => Ok(SerialType::Int48),
            6 => Ok(SerialType::Int64),
            7 => Ok(SerialType::Float64),
            8 => Ok(SerialType::ConstantZero),
            9 => Ok(SerialType::ConstantOne),
            10 | 11 => Err(DatabaseError::UnsupportedSerialType(value)),
            n => {
                let len = usize::try_from((n - 12) / 2)
                    .map_err(|_| DatabaseError::UnsupportedSerialType(value))?;
                if n % 2 == 0 {
                    Ok(SerialType::Blob(len))
                } else {
                    Ok(SerialType::Text(len))
                }
            }
        }
    }

    pub fn as_u64(&self) -> u64 {
        match self {
            SerialType::Null => 0,
            SerialType::Int8 => 1,
            SerialType::Int16 => 2,
            SerialType::Int24 => 3,
            SerialType::Int32 => 4,
            SerialType::Int48 => 5,
            SerialType::Int64 => 6,
            SerialType::Float64 => 7,
            SerialType::ConstantZero => 8,
            SerialType::ConstantOne => 9,
            SerialType::Blob(len) => 12 + 2 * *len as u64,
            SerialType::Text(len) => 13 + 2 * *len as u64,
        }
    }

    /// Number of body bytes the field occupies.
    pub fn size(&self) -> usize {
        match self {
            SerialType::Null | SerialType::ConstantZero | SerialType::ConstantOne => 0,
            SerialType::Int8 => 1,
            SerialType::Int16 => 2,
            SerialType::Int24 => 3,
            SerialType::Int32 => 4,
            SerialType::Int48 => 6,
            SerialType::Int64 | SerialType::Float64 => 8,
            SerialType::Blob(len) | SerialType::Text(len) => *len,
        }
    }

    pub fn for_value(value: &Value) -> Self {
        match value {
            Value::Null => SerialType::Null,
            Value::Int8(_) => SerialType::Int8,
            Value::Int16(_) => SerialType::Int16,
            Value::Int24(_) => SerialType::Int24,
            Value::Int32(_) => SerialType::Int32,
            Value::Int48(_) => SerialType::Int48,
            Value::Int64(_) => SerialType::Int64,
            Value::Float64(_) => SerialType::Float64,
            Value::Text(s) => SerialType::Text(s.len()),
            Value::Blob(b) => SerialType::Blob(b.len()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordField {
    pub serial_type: SerialType,
    /// Offset from the start of the payload.
    pub offset: usize,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub header_length: usize,
    pub fields: Vec<RecordField>,
}

impl RecordHeader {
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let (header_length, mut cursor) = varint::decode(payload, 0)?;
        let header_length = usize::try_from(header_length)
            .ok()
            .filter(|len| *len <= payload.len())
            .ok_or_else(|| {
                DatabaseError::out_of_bounds("record header", 0, payload.len())
            })?;
        if header_length < cursor {
            return Err(DatabaseError::CorruptedRecord {
                reason: format!("header length {} shorter than its own varint", header_length),
            });
        }

        // serial type varints must not run past the header region
        let header = &payload[..header_length];
        let mut fields = Vec::new();
        let mut offset = header_length;
        while cursor < header_length {
            let (raw, consumed) = varint::decode(header, cursor)?;
            let serial_type = SerialType::from_u64(raw)?;
            let size = serial_type.size();
            fields.push(RecordField {
                serial_type,
                offset,
                size,
            });
            offset = offset.checked_add(size).ok_or_else(|| {
                DatabaseError::out_of_bounds("record field", offset, payload.len())
            })?;
            cursor += consumed;
        }

        Ok(Self {
            header_length,
            fields,
        })
    }
}

/// One decoded row payload together with the rowid of its cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub row_id: RowId,
    pub header: RecordHeader,
    pub payload: Vec<u8>,
}

impl Record {
    pub fn decode(row_id: RowId, payload: Vec<u8>) -> Result<Self> {
        let header = RecordHeader::decode(&payload)?;
        Ok(Self {
            row_id,
            header,
            payload,
        })
    }

    pub fn from_cell(cell: LeafCell) -> Result<Self> {
        Self::decode(cell.row_id, cell.payload)
    }

    pub fn field_count(&self) -> usize {
        self.header.fields.len()
    }

    pub fn serial_type(&self, index: usize) -> Option<SerialType> {
        self.header.fields.get(index).map(|f| f.serial_type)
    }

    /// Raw bytes of a field. Text and blob fields use their declared length,
    /// except the last field of the record, which runs to the end of the
    /// payload whatever its declared length.
    pub fn field_bytes(&self, index: usize) -> Result<&[u8]> {
        let field = self.header.fields.get(index).ok_or_else(|| {
            DatabaseError::out_of_bounds("field index", index, self.field_count())
        })?;
        let is_last = index + 1 == self.field_count();
        let variable = matches!(field.serial_type, SerialType::Text(_) | SerialType::Blob(_));

        if variable && is_last {
            return self.payload.get(field.offset..).ok_or_else(|| {
                DatabaseError::out_of_bounds("last field", field.offset, self.payload.len())
            });
        }
        field
            .offset
            .checked_add(field.size)
            .and_then(|end| self.payload.get(field.offset..end))
            .ok_or_else(|| {
                DatabaseError::out_of_bounds(
                    format!("field {}", index),
                    field.offset,
                    self.payload.len(),
                )
            })
    }

    pub fn value(&self, index: usize) -> Result<Value> {
        let bytes = self.field_bytes(index)?;
        let serial_type = self.header.fields[index].serial_type;
        let value = match serial_type {
            SerialType::Null => Value::Null,
            SerialType::Int8 => Value::Int8(read_signed(bytes) as i8),
            SerialType::Int16 => Value::Int16(read_signed(bytes) as i16),
            SerialType::Int24 => Value::Int24(read_signed(bytes) as i32),
            SerialType::Int32 => Value::Int32(read_signed(bytes) as i32),
            SerialType::Int48 => Value::Int48(read_signed(bytes)),
            SerialType::Int64 => Value::Int64(read_signed(bytes)),
            SerialType::Float64 => Value::Float64(f64::from_bits(read_signed(bytes) as u64)),
            SerialType::ConstantZero => Value::Int8(0),
            SerialType::ConstantOne => Value::Int8(1),
            SerialType::Text(_) => {
                let text = std::str::from_utf8(bytes).map_err(|e| DatabaseError::CorruptedRecord {
                    reason: format!("field {} of row {} is not UTF-8: {}", index, self.row_id, e),
                })?;
                Value::Text(text.to_string())
            }
            SerialType::Blob(_) => Value::Blob(bytes.to_vec()),
        };
        Ok(value)
    }

    pub fn values(&self) -> Result<Vec<Value>> {
        (0..self.field_count()).map(|i| self.value(i)).collect()
    }
}

/// Big-endian two's complement of exactly `bytes.len()` bytes, sign-extended.
fn read_signed(bytes: &[u8]) -> i64 {
    let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
    let seed: i64 = if negative { -1 } else { 0 };
    bytes.iter().fold(seed, |acc, b| (acc << 8) | i64::from(*b))
}

/// Serializes values into a record payload, choosing each serial type from
/// the value's variant.
pub fn encode(values: &[Value]) -> Vec<u8> {
    let mut types = Vec::new();
    let mut body = Vec::new();
    for value in values {
        types.extend(varint::encode(SerialType::for_value(value).as_u64()));
        match value {
            Value::Null => {}
            Value::Int8(v) => body.extend_from_slice(&v.to_be_bytes()),
            Value::Int16(v) => body.extend_from_slice(&v.to_be_bytes()),
            Value::Int24(v) => body.extend_from_slice(&v.to_be_bytes()[1..]),
            Value::Int32(v) => body.extend_from_slice(&v.to_be_bytes()),
            Value::Int48(v) => body.extend_from_slice(&v.to_be_bytes()[2..]),
            Value::Int64(v) => body.extend_from_slice(&v.to_be_bytes()),
            Value::Float64(v) => body.extend_from_slice(&v.to_bits().to_be_bytes()),
            Value::Text(s) => body.extend_from_slice(s.as_bytes()),
            Value::Blob(b) => body.extend_from_slice(b),
        }
    }

    // the header length counts its own varint
    let mut header_length = types.len() + 1;
    while varint::encoded_len(header_length as u64) + types.len() != header_length {
        header_length = varint::encoded_len(header_length as u64) + types.len();
    }

    let mut payload = varint::encode(header_length as u64);
    payload.extend(types);
    payload.extend(body);
    payload
}
