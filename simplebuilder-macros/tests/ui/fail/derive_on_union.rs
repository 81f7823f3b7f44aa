//! Compile-fail test: GenerateBuilder on a union.

use simplebuilder_macros::GenerateBuilder;

#[derive(GenerateBuilder)]
pub union Bits {
    pub int: u32,
    pub float: f32,
}

fn main() {
    let bits = Bits { int: 1 };
    let _ = unsafe { (bits.int, bits.float) };
}
