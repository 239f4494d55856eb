//! Default dataset written on a cold start
//!
//! Only used when seeding is enabled and the collection key is absent.

use shared::models::{AssetRef, Category, Dish, LocalizedText};

struct CategorySeed {
    id: &'static str,
    name: (&'static str, &'static str),
    gradient: &'static str,
}

struct DishSeed {
    id: &'static str,
    category_id: &'static str,
    name: (&'static str, &'static str),
    description: (&'static str, &'static str),
    price: f64,
    preparation_time: u32,
    calories: Option<u32>,
    weight: Option<u32>,
    popular: bool,
}

const CATEGORIES: &[CategorySeed] = &[
    CategorySeed {
        id: "cat_pizza",
        name: ("Pizza", "Пицца"),
        gradient: "from-orange-400 to-red-500",
    },
    CategorySeed {
        id: "cat_salads",
        name: ("Salads", "Салаты"),
        gradient: "from-green-400 to-emerald-500",
    },
    CategorySeed {
        id: "cat_soups",
        name: ("Soups", "Супы"),
        gradient: "from-yellow-400 to-orange-500",
    },
    CategorySeed {
        id: "cat_drinks",
        name: ("Drinks", "Напитки"),
        gradient: "from-sky-400 to-blue-500",
    },
];

const DISHES: &[DishSeed] = &[
    DishSeed {
        id: "dish_margherita",
        category_id: "cat_pizza",
        name: ("Margherita", "Маргарита"),
        description: ("Tomato, mozzarella, basil", "Томаты, моцарелла, базилик"),
        price: 9.5,
        preparation_time: 20,
        calories: Some(850),
        weight: Some(450),
        popular: true,
    },
    DishSeed {
        id: "dish_pepperoni",
        category_id: "cat_pizza",
        name: ("Pepperoni", "Пепперони"),
        description: ("Pepperoni, mozzarella, tomato sauce", "Пепперони, моцарелла, томатный соус"),
        price: 11.0,
        preparation_time: 20,
        calories: Some(980),
        weight: Some(480),
        popular: true,
    },
    DishSeed {
        id: "dish_caesar",
        category_id: "cat_salads",
        name: ("Caesar", "Цезарь"),
        description: ("Romaine, chicken, parmesan, croutons", "Романо, курица, пармезан, сухарики"),
        price: 7.0,
        preparation_time: 10,
        calories: Some(420),
        weight: Some(250),
        popular: false,
    },
    DishSeed {
        id: "dish_borscht",
        category_id: "cat_soups",
        name: ("Borscht", "Борщ"),
        description: ("Beetroot soup with sour cream", "Свекольный суп со сметаной"),
        price: 6.0,
        preparation_time: 5,
        calories: Some(310),
        weight: Some(350),
        popular: true,
    },
    DishSeed {
        id: "dish_lemonade",
        category_id: "cat_drinks",
        name: ("Lemonade", "Лимонад"),
        description: ("Fresh lemon, mint", "Свежий лимон, мята"),
        price: 3.0,
        preparation_time: 2,
        calories: None,
        weight: None,
        popular: false,
    },
];

/// Default menu categories
pub fn categories(now: &str) -> Vec<Category> {
    CATEGORIES
        .iter()
        .zip(1..)
        .map(|(seed, sort_order)| Category {
            id: seed.id.to_string(),
            name: LocalizedText::new(seed.name.0, seed.name.1),
            image: AssetRef::default(),
            gradient: seed.gradient.to_string(),
            description: None,
            sort_order,
            is_active: true,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
        .collect()
}

/// Default dishes, all referencing [`categories`]
pub fn dishes(now: &str) -> Vec<Dish> {
    DISHES
        .iter()
        .zip(1..)
        .map(|(seed, sort_order)| Dish {
            id: seed.id.to_string(),
            name: LocalizedText::new(seed.name.0, seed.name.1),
            description: LocalizedText::new(seed.description.0, seed.description.1),
            price: seed.price,
            image: AssetRef::default(),
            category_id: seed.category_id.to_string(),
            is_active: true,
            is_available: true,
            is_popular: seed.popular,
            preparation_time: seed.preparation_time,
            calories: seed.calories,
            weight: seed.weight,
            sort_order,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_consistent() {
        let now = shared::util::now_iso();
        let categories = categories(&now);
        let dishes = dishes(&now);

        for category in &categories {
            assert!(category.validate().is_ok(), "{}", category.id);
        }
        for dish in &dishes {
            assert!(dish.validate().is_ok(), "{}", dish.id);
            assert!(
                categories.iter().any(|c| c.id == dish.category_id),
                "{} references a missing category",
                dish.id
            );
        }
    }
}
