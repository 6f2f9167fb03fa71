// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Built-in meal plan templates.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{DietPlan, Meal};
use crate::services::catalog::slugify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TemplateMeal {
    pub time: &'static str,
    pub name: &'static str,
    pub items: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DietTemplate {
    pub name: &'static str,
    /// Daily energy target in kcal
    pub calories: u32,
    pub meals: &'static [TemplateMeal],
}

/// Template as listed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TemplateView {
    pub slug: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub template: DietTemplate,
}

macro_rules! meal {
    ($time:expr, $name:expr, $items:expr) => {
        TemplateMeal {
            time: $time,
            name: $name,
            items: $items,
        }
    };
}

static TEMPLATES: &[DietTemplate] = &[
    DietTemplate {
        name: "Muscle Gain",
        calories: 2500,
        meals: &[
            meal!("08:00", "Breakfast", "4 eggs, 100g oats, 1 banana"),
            meal!("12:00", "Lunch", "200g rice, 150g chicken, salad"),
            meal!("16:00", "Snack", "Wholegrain bread with peanut butter"),
            meal!("20:00", "Dinner", "200g sweet potato, 150g ground beef"),
            meal!("22:30", "Supper", "Plain yogurt with nuts"),
        ],
    },
    DietTemplate {
        name: "Weight Loss",
        calories: 1800,
        meals: &[
            meal!("08:00", "Breakfast", "2 scrambled eggs, 1 slice of papaya"),
            meal!("12:00", "Lunch", "100g brown rice, 120g fish, vegetables"),
            meal!("16:00", "Snack", "1 apple and 5 almonds"),
            meal!("19:00", "Dinner", "3-egg omelette with spinach"),
            meal!("21:30", "Supper", "Chamomile tea and 2 walnuts"),
        ],
    },
    DietTemplate {
        name: "Cutting",
        calories: 2100,
        meals: &[
            meal!("07:30", "Breakfast", "Tapioca with 3 egg whites and 1 yolk"),
            meal!("12:30", "Lunch", "Green salad, 150g chicken, 80g rice"),
            meal!("15:30", "Snack", "Whey protein with water"),
            meal!("19:30", "Dinner", "150g tilapia and steamed broccoli"),
            meal!("22:00", "Supper", "Avocado (50g)"),
        ],
    },
];

/// All templates, in display order.
pub fn templates() -> Vec<TemplateView> {
    TEMPLATES
        .iter()
        .map(|template| TemplateView {
            slug: slugify(template.name),
            template: *template,
        })
        .collect()
}

/// Find a template by slug or display name.
pub fn find_template(name: &str) -> Option<&'static DietTemplate> {
    let slug = slugify(name);
    if slug.is_empty() {
        return None;
    }
    TEMPLATES.iter().find(|t| slugify(t.name) == slug)
}

impl DietTemplate {
    /// Fresh plan holding a copy of the template's meals.
    pub fn to_plan(&self) -> DietPlan {
        DietPlan {
            meals: self
                .meals
                .iter()
                .map(|m| Meal {
                    time: m.time.to_string(),
                    name: m.name.to_string(),
                    items: m.items.to_string(),
                })
                .collect(),
            ..DietPlan::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_have_unique_slugs() {
        let views = templates();
        let slugs: Vec<_> = views.iter().map(|v| v.slug.as_str()).collect();
        assert_eq!(slugs, ["muscle-gain", "weight-loss", "cutting"]);
    }

    #[test]
    fn test_find_template_by_slug_or_name() {
        assert_eq!(find_template("weight-loss").map(|t| t.calories), Some(1800));
        assert_eq!(find_template("Muscle Gain").map(|t| t.calories), Some(2500));
        assert!(find_template("keto").is_none());
        assert!(find_template("  ").is_none());
    }

    #[test]
    fn test_template_plan_passes_validation() {
        for template in TEMPLATES {
            let mut plan = template.to_plan();
            assert_eq!(plan.validate(), Ok(()), "{}", template.name);
            assert_eq!(plan.meals.len(), template.meals.len());
        }
    }

    #[test]
    fn test_serialized_view_is_flat() {
        let value = serde_json::to_value(&templates()[2]).unwrap();
        assert_eq!(value["slug"], "cutting");
        assert_eq!(value["calories"], 2100);
        assert_eq!(value["meals"][0]["time"], "07:30");
    }
}
