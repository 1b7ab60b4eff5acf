use crate::error::{Error, Result};

/// Longest string a single length byte can describe
pub const MAX_VAR_STRING_LEN: usize = u8::MAX as usize;

/// Binary writer for decompressed save payloads
pub struct BinaryWriter {
    data: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { data: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(if v { 1 } else { 0 });
    }

    pub fn write_u16_le(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i16_le(&mut self, v: i16) {
        self.write_u16_le(v as u16);
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32_le(&mut self, v: i32) {
        self.write_u32_le(v as u32);
    }

    pub fn write_f32_le(&mut self, v: f32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    /// Write a string prefixed with a single length byte
    pub fn write_var_string(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_VAR_STRING_LEN {
            return Err(Error::StringTooLong { len: bytes.len(), max: MAX_VAR_STRING_LEN });
        }
        self.write_u8(bytes.len() as u8);
        self.write_bytes(bytes);
        Ok(())
    }

    /// Write a `u16` element count, rejecting lists the field cannot describe
    pub fn write_count_u16(&mut self, field: &'static str, len: usize) -> Result<()> {
        let count = u16::try_from(len).map_err(|_| Error::ListTooLong {
            field,
            len,
            max: u16::MAX as usize,
        })?;
        self.write_u16_le(count);
        Ok(())
    }

    pub fn write_u16_list(&mut self, field: &'static str, values: &[u16]) -> Result<()> {
        self.write_count_u16(field, values.len())?;
        for &v in values {
            self.write_u16_le(v);
        }
        Ok(())
    }

    /// Write a byte list behind a `u8` count
    pub fn write_byte_list(&mut self, field: &'static str, values: &[u8]) -> Result<()> {
        if values.len() > u8::MAX as usize {
            return Err(Error::ListTooLong { field, len: values.len(), max: u8::MAX as usize });
        }
        self.write_u8(values.len() as u8);
        self.write_bytes(values);
        Ok(())
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BinaryWriter> for Vec<u8> {
    fn from(writer: BinaryWriter) -> Self {
        writer.data
    }
}
