//! Compile-fail test: GenerateBuilder on an enum.

use simplebuilder_macros::GenerateBuilder;

#[derive(GenerateBuilder)]
pub enum Color {
    Red,
}

fn main() {
    let _ = Color::Red;
}
