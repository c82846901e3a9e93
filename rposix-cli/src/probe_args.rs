use anyhow::{bail, Context, Result};
use rposix_core::{NativeBuffer, Variant};

/// One command-line argument, decoded into what the operation will receive.
pub enum ProbeArg {
    Value(Variant),
    /// A zeroed native buffer; the operation receives its pointer.
    Buffer(NativeBuffer),
}

impl ProbeArg {
    pub fn variant(&self) -> Variant {
        match self {
            ProbeArg::Value(v) => v.clone(),
            ProbeArg::Buffer(buf) => Variant::Pointer(buf.pointer()),
        }
    }
}

/// Decode one argument:
/// - `nil`
/// - integers, decimal or `0x`/`0o` prefixed, optionally negative
/// - `:NAME` symbols
/// - `buf:N` an N-byte buffer
/// - `'text'` or anything else: a string
pub fn parse_arg(s: &str) -> Result<ProbeArg> {
    if s == "nil" {
        return Ok(ProbeArg::Value(Variant::Nil));
    }
    if let Some(len) = s.strip_prefix("buf:") {
        let len: usize = len
            .parse()
            .with_context(|| format!("buffer length in {:?}", s))?;
        return Ok(ProbeArg::Buffer(NativeBuffer::new(len)));
    }
    if let Some(name) = s.strip_prefix(':') {
        if name.is_empty() {
            bail!("empty symbol");
        }
        return Ok(ProbeArg::Value(Variant::Symbol(name.to_owned())));
    }
    if let Some(text) = s.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return Ok(ProbeArg::Value(Variant::from(text)));
    }
    Ok(ProbeArg::Value(match parse_int(s) {
        Some(v) => Variant::Int(v),
        None => Variant::from(s),
    }))
}

fn parse_int(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()?
    } else if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()?
    } else {
        return None;
    };
    Some(if negative { -value } else { value })
}
