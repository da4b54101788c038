//! Benchmarks for the hot policy evaluation path.
//!
//! The evaluation runs once per UI render and once per boundary request, so
//! it must stay allocation-light and comfortably sub-microsecond.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use opsledger_authz::{
    check_permission, Action, Actor, Module, OrgRole, PermissionKey, PermissionOverride,
};
use opsledger_core::{ActorId, TenantId};

fn override_set(tenant_id: TenantId, count: usize) -> Vec<PermissionOverride> {
    PermissionKey::all()
        .take(count)
        .enumerate()
        .map(|(i, key)| PermissionOverride {
            tenant_id,
            role: OrgRole::ALL[i % OrgRole::ALL.len()],
            key,
            is_enabled: i % 2 == 0,
        })
        .collect()
}

fn bench_check_permission(c: &mut Criterion) {
    let tenant_id = TenantId::new();
    let member = Actor::user(ActorId::new())
        .with_membership(tenant_id, OrgRole::Manager)
        .unwrap();
    let owner = Actor::user(ActorId::new())
        .with_membership(tenant_id, OrgRole::Owner)
        .unwrap();
    let key = PermissionKey::new(Module::Invoices, Action::Create);

    let empty: Vec<PermissionOverride> = Vec::new();
    let populated = override_set(tenant_id, 32);

    c.bench_function("check_permission/matrix_fallback", |b| {
        b.iter(|| {
            black_box(check_permission(
                black_box(&member),
                tenant_id,
                key,
                false,
                &empty,
            ))
        })
    });

    c.bench_function("check_permission/override_scan_32", |b| {
        b.iter(|| {
            black_box(check_permission(
                black_box(&member),
                tenant_id,
                key,
                false,
                &populated,
            ))
        })
    });

    c.bench_function("check_permission/owner_bypass", |b| {
        b.iter(|| {
            black_box(check_permission(
                black_box(&owner),
                tenant_id,
                key,
                false,
                &populated,
            ))
        })
    });
}

criterion_group!(benches, bench_check_permission);
criterion_main!(benches);
