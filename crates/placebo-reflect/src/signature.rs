use placebo_ir::{ClassName, MethodRef, ReturnType, Type};

use crate::error::SignatureError;

/// Parse a bracketed method signature: `<java.util.ArrayList: void <init>(int)>`.
pub fn parse_method_signature(input: &str) -> Result<MethodRef, SignatureError> {
    let err = || SignatureError(input.to_string());

    let inner = input
        .trim()
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .ok_or_else(err)?;
    let (class, rest) = inner.split_once(": ").ok_or_else(err)?;
    let (return_type, rest) = rest.trim().split_once(' ').ok_or_else(err)?;
    let open = rest.find('(').ok_or_else(err)?;
    let params = rest[open + 1..].strip_suffix(')').ok_or_else(err)?;
    let name = rest[..open].trim();

    if class.trim().is_empty() || name.is_empty() {
        return Err(err());
    }

    let return_type: ReturnType = return_type.parse().map_err(|_| err())?;
    let params = if params.trim().is_empty() {
        Vec::new()
    } else {
        params
            .split(',')
            .map(|p| p.parse::<Type>().map_err(|_| err()))
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(MethodRef {
        class: ClassName::new(class.trim()),
        name: name.to_string(),
        params,
        return_type,
    })
}
