//! BDD step definitions for admin console and session features

use std::sync::Arc;

use cucumber::{given, then, when};

use yedalm::entity::{Facility, FacilityDraft};
use yedalm::mock::{MemoryStore, StoreCall};
use yedalm::page::HomePage;
use yedalm::session::{AdminGate, SessionRegistry};
use yedalm::YedalmError;

use crate::world::YedalmWorld;

#[given("the demo content store")]
fn demo_store(world: &mut YedalmWorld) {
    world.store = Some(Arc::new(MemoryStore::seeded()));
}

#[given(expr = "writes to {string} fail")]
fn writes_fail(world: &mut YedalmWorld, collection: String) {
    world.store().fail_writes(&collection);
}

#[given(expr = "loading {string} fails")]
fn loading_fails(world: &mut YedalmWorld, collection: String) {
    world.store().fail_selects(&collection);
}

#[when(expr = "the admin logs in with password {string}")]
async fn log_in(world: &mut YedalmWorld, password: String) {
    let store = world.store();
    let registry = world
        .registry
        .get_or_insert_with(|| Arc::new(SessionRegistry::new(store.clone())))
        .clone();

    match AdminGate::new(store).login(&password).await {
        Ok(session) => {
            world.session_token = Some(session.token().to_string());
            registry.open(session).await;
        }
        Err(e) => world.login_error = Some(e),
    }
}

#[when("the admin logs out")]
async fn log_out(world: &mut YedalmWorld) {
    let token = world.session_token.as_ref().expect("not logged in");
    let registry = world.registry.as_ref().expect("no registry");
    assert!(registry.close(token).await);
}

#[when(expr = "a facility named {string} is added")]
async fn add_facility(world: &mut YedalmWorld, name: String) {
    let draft = FacilityDraft {
        name,
        description: String::new(),
        image_url: String::new(),
    };
    world.saved = Some(world.console().add::<Facility>(&draft).await);
}

#[when("the home page is loaded")]
async fn load_home(world: &mut YedalmWorld) {
    let store: Arc<dyn yedalm::store::RemoteStore> = world.store();
    world.home = Some(HomePage::load(&store).await);
}

#[then("a session is open for that token")]
async fn session_open(world: &mut YedalmWorld) {
    let token = world.session_token.as_ref().expect("not logged in");
    let registry = world.registry.as_ref().expect("no registry");
    assert!(registry.lookup(token).await.is_ok());
}

#[then("the token no longer opens the console")]
async fn session_closed(world: &mut YedalmWorld) {
    let token = world.session_token.as_ref().expect("not logged in");
    let registry = world.registry.as_ref().expect("no registry");
    assert!(matches!(
        registry.lookup(token).await,
        Err(YedalmError::Unauthorized)
    ));
}

#[then("the login is rejected")]
fn login_rejected(world: &mut YedalmWorld) {
    assert!(world.session_token.is_none());
    assert!(matches!(world.login_error, Some(YedalmError::Unauthorized)));
}

#[then(expr = "the facility list ends with {string} at order index {int}")]
async fn facility_list_ends_with(world: &mut YedalmWorld, name: String, order_index: i32) {
    let rows = world.console().rows::<Facility>().await;
    let last = rows.last().expect("facility list is empty");
    assert_eq!(last.name, name);
    assert_eq!(last.order_index, order_index);
    assert!(last.is_active);
}

#[then("the save fails")]
fn save_fails(world: &mut YedalmWorld) {
    assert!(matches!(world.saved, Some(Err(_))));
}

#[then("the save is rejected as invalid")]
fn save_rejected(world: &mut YedalmWorld) {
    assert!(matches!(world.saved, Some(Err(YedalmError::Site(_)))));
    assert!(!world
        .store()
        .calls()
        .iter()
        .any(|c| matches!(c, StoreCall::Insert { .. })));
}

#[then(expr = "the facility list has {int} row(s)")]
async fn facility_count(world: &mut YedalmWorld, count: usize) {
    assert_eq!(world.console().rows::<Facility>().await.len(), count);
}

#[then(expr = "the home page shows {int} slides, {int} organizations and {int} facilities")]
fn home_counts(world: &mut YedalmWorld, slides: usize, organizations: usize, facilities: usize) {
    let home = world.home.as_ref().expect("home page not loaded");
    assert_eq!(home.slides.len(), slides);
    assert_eq!(home.organizations.len(), organizations);
    assert_eq!(home.facilities.len(), facilities);
}

#[then("the home page has no scripture")]
fn no_scripture(world: &mut YedalmWorld) {
    let home = world.home.as_ref().expect("home page not loaded");
    assert!(home.scripture.is_none());
}
