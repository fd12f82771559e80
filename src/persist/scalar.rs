//! Leaf implementations for the arithmetic scalars, booleans, characters
//! and strings.

use crate::archive::{InArchive, OutArchive};
use crate::error::Result;
use crate::persist::Persist;

/// Host-order byte view of a dense scalar slice. Restricted to the
/// fixed-width arithmetic types below, where every bit pattern is a valid
/// value in both directions.
fn slice_bytes<T>(items: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(items.as_ptr().cast::<u8>(), std::mem::size_of_val(items)) }
}

fn slice_bytes_mut<T>(items: &mut [T]) -> &mut [u8] {
    unsafe {
        std::slice::from_raw_parts_mut(
            items.as_mut_ptr().cast::<u8>(),
            std::mem::size_of_val(items),
        )
    }
}

macro_rules! scalar_leaf {
    ($($ty:ty => $emit:ident / $consume:ident),+ $(,)?) => {
        $(
            impl Persist for $ty {
                fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
                    ar.encoder().$emit(*self)
                }

                fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
                    *self = ar.decoder().$consume()?;
                    Ok(())
                }

                const PACKED: bool = true;

                fn bulk_bytes(items: &[Self]) -> Option<&[u8]> {
                    Some(slice_bytes(items))
                }

                fn bulk_bytes_mut(items: &mut [Self]) -> Option<&mut [u8]> {
                    Some(slice_bytes_mut(items))
                }
            }
        )+
    };
}

scalar_leaf! {
    u8 => emit_u8 / consume_u8,
    u16 => emit_u16 / consume_u16,
    u32 => emit_u32 / consume_u32,
    u64 => emit_u64 / consume_u64,
    usize => emit_usize / consume_usize,
    i8 => emit_i8 / consume_i8,
    i16 => emit_i16 / consume_i16,
    i32 => emit_i32 / consume_i32,
    i64 => emit_i64 / consume_i64,
    isize => emit_isize / consume_isize,
    f32 => emit_f32 / consume_f32,
    f64 => emit_f64 / consume_f64,
}

/// Booleans are a single validated byte in binary, so they never take the
/// bulk path.
impl Persist for bool {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.encoder().emit_bool(*self)
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        *self = ar.decoder().consume_bool()?;
        Ok(())
    }
}

/// Characters travel as their `u32` scalar value and are validated on the
/// way back in.
impl Persist for char {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.encoder().emit_char(*self)
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        *self = ar.decoder().consume_char()?;
        Ok(())
    }
}

impl Persist for String {
    fn save(&self, ar: &mut OutArchive<'_>) -> Result<()> {
        ar.encoder().emit_str(self)
    }

    fn load(&mut self, ar: &mut InArchive<'_>) -> Result<()> {
        *self = ar.decoder().consume_str()?;
        Ok(())
    }
}
