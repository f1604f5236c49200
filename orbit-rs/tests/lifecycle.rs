//! Lifecycle binding: scope teardown, back-stack re-entry and retained owners.

use orbit_rs::{
    Application, Binding, Component, Container, LifecycleBinder, Params, RetainedOwner,
    ScopeLifecycle,
};

#[derive(Component)]
struct Screen;

#[derive(Component)]
struct Widget;

#[derive(Debug, Component)]
struct Detail(usize);

fn app() -> Application {
    let app = Application::new();
    let container = app.container();
    container.component::<Screen>().provide(|| Screen).unwrap();
    container
        .component::<Widget>()
        .child_of::<Screen>()
        .provide(|_| Widget)
        .unwrap();
    container
        .component::<Detail>()
        .provide_with_params(|index: &usize| Detail(*index))
        .unwrap();
    app
}

#[test]
fn scope_end_clears_holder_and_children() {
    let app = app();
    let scope = ScopeLifecycle::with_id("main");
    let screen = app.scoped::<Screen>(Params::none(), &scope).unwrap();
    app.container().get::<Widget>().unwrap();
    assert_eq!(app.container().stats().holders, 2);

    scope.destroy();
    assert!(!screen.is_live());
    assert_eq!(app.container().stats().holders, 0);
    assert_eq!(app.binder().scoped_bindings(), 0);
}

#[test]
fn same_scope_id_binds_once() {
    let app = app();
    let binder = app.binder();
    let holder = app.container().holder::<Screen>().unwrap();

    // Two notification objects for one logical back-stack entry.
    let first = ScopeLifecycle::with_id("detail/3");
    let again = ScopeLifecycle::with_id("detail/3");
    assert_eq!(binder.bind_once(&holder, &first), Binding::Bound);
    assert_eq!(binder.bind_once(&holder, &first), Binding::AlreadyBound);
    assert_eq!(binder.bind_once(&holder, &again), Binding::AlreadyBound);
    assert_eq!(first.observer_count(), 1);
    assert_eq!(again.observer_count(), 0);

    first.destroy();
    assert!(!holder.is_live());
}

#[test]
fn rebinding_after_scope_end_binds_new_holder() {
    let app = app();
    let first = ScopeLifecycle::with_id("detail/1");
    let old = app.scoped::<Detail>(Params::new(1usize), &first).unwrap();
    first.destroy();

    let second = ScopeLifecycle::with_id("detail/1");
    let fresh = app.scoped::<Detail>(Params::new(1usize), &second).unwrap();
    assert_ne!(old.id(), fresh.id());
    assert_eq!(second.observer_count(), 1);
    assert_eq!(fresh.0, 1);
}

#[test]
fn anonymous_scopes_each_get_an_observer() {
    let app = app();
    let holder = app.container().holder::<Screen>().unwrap();
    let one = ScopeLifecycle::new();
    let two = ScopeLifecycle::new();
    assert_eq!(app.binder().bind_once(&holder, &one), Binding::Bound);
    assert_eq!(app.binder().bind_once(&holder, &two), Binding::Bound);

    one.destroy();
    assert!(!holder.is_live());
    let replacement = app.container().holder::<Screen>().unwrap();
    two.destroy();
    assert!(replacement.is_live());
}

#[test]
fn binding_to_ended_scope_clears_immediately() {
    let app = app();
    let scope = ScopeLifecycle::with_id("gone");
    scope.destroy();
    let holder = app.scoped::<Screen>(Params::none(), &scope).unwrap();
    assert!(!holder.is_live());
    assert_eq!(app.container().stats().holders, 0);
}

#[test]
fn retained_holder_survives_until_last_owner_closes() {
    let app = app();
    let first = RetainedOwner::new();
    let second = RetainedOwner::new();
    let holder = app.retained::<Screen>(Params::none(), &first).unwrap();
    let same = app.retained::<Screen>(Params::none(), &second).unwrap();
    assert_eq!(holder.id(), same.id());
    assert_eq!(app.binder().retained_consumers(&holder.id()), 2);

    first.close();
    assert!(holder.is_live());
    assert_eq!(app.binder().retained_consumers(&holder.id()), 1);

    drop(second);
    assert!(!holder.is_live());
    assert_eq!(app.binder().retained_stats().holders, 0);
}

#[test]
fn retaining_twice_with_one_owner_counts_once() {
    let app = app();
    let owner = RetainedOwner::new();
    let holder = app.container().holder::<Screen>().unwrap();
    assert_eq!(app.binder().bind_retained(&holder, &owner), Binding::Bound);
    assert_eq!(
        app.binder().bind_retained(&holder, &owner),
        Binding::AlreadyBound
    );
    owner.close();
    assert!(!holder.is_live());
}

#[test]
fn closing_owner_of_stale_holder_keeps_new_instance() {
    let app = app();
    let owner = RetainedOwner::new();
    let stale = app.retained::<Screen>(Params::none(), &owner).unwrap();
    app.container().clear::<Screen>(Params::none());
    let fresh = app.container().holder::<Screen>().unwrap();

    owner.close();
    assert!(!stale.is_live());
    assert!(fresh.is_live());
}

#[test]
fn binder_outliving_container_is_harmless() {
    let binder = LifecycleBinder::new();
    let scope = ScopeLifecycle::with_id("orphan");
    {
        let container = Container::new();
        container.component::<Screen>().provide(|| Screen).unwrap();
        let holder = container.holder::<Screen>().unwrap();
        assert_eq!(binder.bind_once(&holder, &scope), Binding::Bound);
    }
    assert_eq!(binder.scoped_bindings(), 1);
    scope.destroy();
    assert_eq!(binder.scoped_bindings(), 0);
}
