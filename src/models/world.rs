use crate::models::{generator::GeneratorRegistry, planet::Planet};

/// ワールドコンテキスト
///
/// シーンに1つの惑星と、ジェネレーターの空間レジストリを保持します。
/// ユニットのステートからは読み取り専用で参照されます。
#[derive(Debug, Clone)]
pub struct World {
    pub planet: Planet,
    pub generators: GeneratorRegistry,
}

impl World {
    pub fn new(planet: Planet) -> Self {
        Self {
            planet,
            generators: GeneratorRegistry::new(),
        }
    }
}
