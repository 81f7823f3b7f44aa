use simplebuilder_macros::GenerateBuilder;

#[derive(Debug, GenerateBuilder)]
pub struct Person {
    pub name: String,
    pub age: u32,
}

#[derive(Debug, GenerateBuilder)]
pub struct Unit;

fn main() {
    let person = Person {
        name: "Ada".to_string(),
        age: 36,
    };
    println!("{person:?} {:?}", Unit);
}
