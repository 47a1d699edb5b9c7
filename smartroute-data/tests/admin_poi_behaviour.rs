//! Behavioural tests for [`AdminPoiRepository`].
//!
//! Scenarios run against an in-memory catalogue and a [`MemoryMirror`]. Async
//! repository calls are driven by a current-thread runtime inside each step.

use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use smartroute_core::{
    CascadeOutcome,
    mirror::POIS_COLLECTION,
    test_support::MemoryMirror,
};
use smartroute_data::{
    AdminError, AdminPoiRepository, PoiRecord, RouteRecord, SqliteCatalogue, StopList,
};

#[derive(Default)]
struct AdminWorld {
    catalogue: RefCell<Option<SqliteCatalogue>>,
    mirror: RefCell<Option<Arc<MemoryMirror>>>,
    repo: RefCell<Option<AdminPoiRepository>>,
    outcome: RefCell<Option<Result<CascadeOutcome, AdminError>>>,
    groups: RefCell<Vec<Vec<PoiRecord>>>,
}

fn seed(pois: &[(&str, &str)]) -> SqliteCatalogue {
    let catalogue = SqliteCatalogue::open_in_memory().expect("open catalogue");
    for (index, (id, name)) in (0_u32..).zip(pois) {
        let location = Coord {
            x: 22.9 + f64::from(index) * 0.01,
            y: 40.6,
        };
        catalogue
            .upsert_poi(&PoiRecord::new(*id, *name, "", location))
            .expect("insert poi");
    }
    catalogue
}

impl AdminWorld {
    fn mirror(&self) -> Arc<MemoryMirror> {
        self.mirror
            .borrow()
            .clone()
            .expect("mirror must be configured")
    }

    /// Build the repository from the seeded catalogue and run `op` on it.
    fn act<F, Fut>(&self, op: F)
    where
        F: FnOnce(AdminPoiRepository) -> Fut,
        Fut: Future<Output = (AdminPoiRepository, Result<CascadeOutcome, AdminError>)>,
    {
        let catalogue = self
            .catalogue
            .borrow_mut()
            .take()
            .expect("catalogue must be seeded");
        let repo = AdminPoiRepository::with_mirror(catalogue, self.mirror());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("build runtime");
        let (repo, outcome) = runtime.block_on(op(repo));
        self.repo.replace(Some(repo));
        self.outcome.replace(Some(outcome));
    }

    fn with_catalogue<T>(&self, read: impl FnOnce(&SqliteCatalogue) -> T) -> T {
        let repo = self.repo.borrow();
        read(repo.as_ref().expect("repository must exist").catalogue())
    }
}

#[fixture]
fn world() -> AdminWorld {
    AdminWorld::default()
}

// --- Given steps ---

#[given("a catalogue with route r1 from a through b to c")]
fn route_through_three(#[from(world)] world: &AdminWorld) {
    let catalogue = seed(&[("a", "Αγορά"), ("b", "Βιβλιοθήκη"), ("c", "Λιμάνι")]);
    catalogue
        .upsert_route(&RouteRecord::new("r1", "Γραμμή 1", "a", "c"))
        .expect("insert route");
    for stop in ["a", "b", "c"] {
        catalogue
            .push_stop(StopList::Waypoints, "r1", stop)
            .expect("push waypoint");
    }
    world.catalogue.replace(Some(catalogue));
}

#[given("a catalogue with POIs named A and a")]
fn pois_differing_in_case(#[from(world)] world: &AdminWorld) {
    let catalogue = seed(&[("1", "A"), ("2", "Β"), ("3", "a")]);
    world.catalogue.replace(Some(catalogue));
}

#[given("a healthy mirror")]
fn healthy_mirror(#[from(world)] world: &AdminWorld) {
    world.mirror.replace(Some(Arc::new(MemoryMirror::default())));
}

#[given("an unreachable mirror")]
fn unreachable_mirror(#[from(world)] world: &AdminWorld) {
    world.mirror.replace(Some(Arc::new(MemoryMirror::failing())));
}

// --- When steps ---

#[when("POI c is merged into POI b")]
fn merge_c_into_b(#[from(world)] world: &AdminWorld) {
    world.act(|mut repo| async move {
        let outcome = repo.merge_pois("b", "c").await;
        (repo, outcome)
    });
}

#[when("POI a is deleted")]
fn delete_a(#[from(world)] world: &AdminWorld) {
    world.act(|mut repo| async move {
        let outcome = repo.delete_poi("a").await;
        (repo, outcome)
    });
}

#[when("POI b is deleted")]
fn delete_b(#[from(world)] world: &AdminWorld) {
    world.act(|mut repo| async move {
        let outcome = repo.delete_poi("b").await;
        (repo, outcome)
    });
}

#[when("POIs are grouped by name")]
fn group_by_name(#[from(world)] world: &AdminWorld) {
    let catalogue = world
        .catalogue
        .borrow_mut()
        .take()
        .expect("catalogue must be seeded");
    let repo = AdminPoiRepository::new(catalogue);
    world
        .groups
        .replace(repo.pois_with_same_name().expect("group pois"));
}

// --- Then steps ---

#[then("route r1 ends at b")]
fn route_ends_at_b(#[from(world)] world: &AdminWorld) {
    let route = world.with_catalogue(|catalogue| catalogue.route("r1").expect("read route"));
    assert_eq!(route.map(|route| route.end_poi_id), Some("b".to_owned()));
}

#[then("route r1 visits a, b, b")]
fn route_visits_merged(#[from(world)] world: &AdminWorld) {
    let stops = world.with_catalogue(|catalogue| {
        catalogue
            .stops(StopList::Waypoints, "r1")
            .expect("read stops")
    });
    assert_eq!(stops, ["a", "b", "b"]);
}

#[then("route r1 visits a, c")]
fn route_visits_without_b(#[from(world)] world: &AdminWorld) {
    let stops = world.with_catalogue(|catalogue| {
        catalogue
            .stops(StopList::Waypoints, "r1")
            .expect("read stops")
    });
    assert_eq!(stops, ["a", "c"]);
}

#[then("POI c no longer exists")]
fn poi_c_gone(#[from(world)] world: &AdminWorld) {
    let poi = world.with_catalogue(|catalogue| catalogue.poi("c").expect("read poi"));
    assert!(poi.is_none(), "expected POI c to be deleted, found {poi:?}");
}

#[then("the mirror no longer holds POI c")]
fn mirror_dropped_c(#[from(world)] world: &AdminWorld) {
    assert!(!world.mirror().contains(POIS_COLLECTION, "c"));
    assert!(world.mirror().contains(POIS_COLLECTION, "b"));
}

#[then("the mirror no longer holds POI b")]
fn mirror_dropped_b(#[from(world)] world: &AdminWorld) {
    assert!(!world.mirror().contains(POIS_COLLECTION, "b"));
}

#[then("the operation reports a remote failure")]
fn remote_failure(#[from(world)] world: &AdminWorld) {
    let outcome = world.outcome.borrow();
    assert!(
        matches!(&*outcome, Some(Err(AdminError::Mirror(_)))),
        "expected a mirror error, got {outcome:?}"
    );
}

#[then("the delete is refused because a anchors r1")]
fn delete_refused(#[from(world)] world: &AdminWorld) {
    let outcome = world.outcome.borrow();
    assert!(
        matches!(
            &*outcome,
            Some(Err(AdminError::PoiInUse { poi_id, route_id })) if poi_id == "a" && route_id == "r1"
        ),
        "expected PoiInUse, got {outcome:?}"
    );
    let poi = world.with_catalogue(|catalogue| catalogue.poi("a").expect("read poi"));
    assert!(poi.is_some());
}

#[then("the mirror was not called")]
fn mirror_untouched(#[from(world)] world: &AdminWorld) {
    assert!(world.mirror().calls().is_empty());
}

#[then("one group holds both POIs")]
fn one_name_group(#[from(world)] world: &AdminWorld) {
    let groups = world.groups.borrow();
    let ids: Vec<Vec<&str>> = groups
        .iter()
        .map(|group| group.iter().map(|poi| poi.id.as_str()).collect())
        .collect();
    assert_eq!(ids, vec![vec!["1", "3"]]);
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/admin_poi.feature", name = $title)]
        fn $fn_name(world: AdminWorld) {
            let _ = world;
        }
    };
}

register_scenario!(
    merge_rewrites_route_end,
    "merging a POI rewrites the route ending at it"
);
register_scenario!(
    merge_survives_remote_outage,
    "a POI merge still applies locally during a remote outage"
);
register_scenario!(
    delete_refuses_endpoint,
    "deleting a route endpoint is refused"
);
register_scenario!(
    delete_closes_gap,
    "deleting a waypoint closes the gap"
);
register_scenario!(
    grouping_ignores_case,
    "POIs with the same name in different case are grouped"
);
