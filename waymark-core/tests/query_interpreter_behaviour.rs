//! Behavioural tests for [`QueryInterpreter`].

use std::{cell::RefCell, str::FromStr};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use waymark_core::{Category, QueryIntent, QueryInterpreter, RegionId};

#[derive(Debug, Default)]
struct InterpreterWorld {
    interpreter: RefCell<Option<QueryInterpreter>>,
    intent: RefCell<Option<QueryIntent>>,
}

#[fixture]
fn world() -> InterpreterWorld {
    InterpreterWorld::default()
}

fn unquote(text: &str) -> &str {
    text.trim().trim_matches('"')
}

fn intent(world: &InterpreterWorld) -> QueryIntent {
    world
        .intent
        .borrow()
        .clone()
        .expect("a query should have been interpreted")
}

#[given("the standard dictionaries")]
fn given_dictionaries(world: &InterpreterWorld) {
    world.interpreter.replace(Some(QueryInterpreter::standard()));
}

#[when("I interpret {query}")]
fn when_interpret(world: &InterpreterWorld, query: String) {
    let interpreted = world
        .interpreter
        .borrow()
        .as_ref()
        .expect("dictionaries should be loaded")
        .interpret(unquote(&query));
    world.intent.replace(Some(interpreted));
}

#[then("the category is {category}")]
fn then_category(world: &InterpreterWorld, category: String) {
    let expected = Category::from_str(unquote(&category)).expect("known category");
    assert_eq!(intent(world).category, Some(expected));
}

#[then("no category is detected")]
fn then_no_category(world: &InterpreterWorld) {
    assert_eq!(intent(world).category, None);
}

#[then("the region is {region}")]
fn then_region(world: &InterpreterWorld, region: String) {
    assert_eq!(intent(world).region, Some(RegionId::new(unquote(&region))));
}

#[then("no region is detected")]
fn then_no_region(world: &InterpreterWorld) {
    assert_eq!(intent(world).region, None);
}

#[then("the query is marked nearby")]
fn then_nearby(world: &InterpreterWorld) {
    assert!(intent(world).nearby);
}

#[then("the search term is {term}")]
fn then_term(world: &InterpreterWorld, term: String) {
    assert_eq!(intent(world).search_term, unquote(&term));
}

#[scenario(path = "tests/features/query_interpreter.feature", index = 0)]
fn nearby_phrase(world: InterpreterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_interpreter.feature", index = 1)]
fn trailing_region(world: InterpreterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_interpreter.feature", index = 2)]
fn unknown_term_with_region(world: InterpreterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_interpreter.feature", index = 3)]
fn in_form(world: InterpreterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/query_interpreter.feature", index = 4)]
fn fuzzy_match(world: InterpreterWorld) {
    let _ = world;
}
