// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android bridge via JNI.
//
// Static natives on `com.coasters.bridge.NativeCatalog`. The Kotlin side holds
// arenas as `long` keys and handles as packed `long`s (see `registry`).
//
// `configure(baseUrl)` may be called once, before the first fetch, to point
// the process-wide service at a host; otherwise the environment and the
// fallback hosts decide. A confined arena (`openArena(true)`) must be closed
// with `closeArena` once the caller has copied what it needs out of its
// handles. An auto arena (`openArena(false)`) is registered by `NativeCatalog`
// with a `java.lang.ref.Cleaner` whose action calls `releaseArena`, so it is
// freed when its Kotlin owner becomes unreachable.
//
// Errors surface as Java exceptions:
//   ArenaClosed          -> java.lang.IllegalStateException
//   IndexOutOfRange      -> java.lang.IndexOutOfBoundsException
//   unreachable / decode -> java.io.IOException
//   anything else        -> java.lang.RuntimeException
// A native that throws returns 0 or null; the value is never observed.

#![cfg(target_os = "android")]

use std::sync::LazyLock;

use jni::JNIEnv;
use jni::objects::{JClass, JString};
use jni::sys::{jboolean, jint, jlong, jstring};

use coasters_core::error::{CoastersError, Result};

use crate::arena::{Arena, ArenaScope, Slot};
use crate::handle::{CatalogHandle, CategoryHandle};
use crate::registry::{ArenaRegistry, arena_key, pack, unpack};
use crate::service::{CatalogService, SharedService};

static ARENAS: LazyLock<ArenaRegistry> = LazyLock::new(ArenaRegistry::new);
static SERVICE: SharedService = SharedService::new();

fn service() -> Result<&'static CatalogService> {
    SERVICE.get()
}

fn jni_err(context: &str, e: jni::errors::Error) -> CoastersError {
    CoastersError::Bridge(format!("{context}: {e}"))
}

fn exception_class(err: &CoastersError) -> &'static str {
    match err {
        CoastersError::ArenaClosed => "java/lang/IllegalStateException",
        CoastersError::IndexOutOfRange { .. } => "java/lang/IndexOutOfBoundsException",
        e if e.is_service_unavailable() => "java/io/IOException",
        _ => "java/lang/RuntimeException",
    }
}

/// Run `body`; on error raise the matching Java exception and return `fallback`.
fn guard<'local, T>(
    env: &mut JNIEnv<'local>,
    fallback: T,
    body: impl FnOnce(&mut JNIEnv<'local>) -> Result<T>,
) -> T {
    match body(env) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "native call failed");
            if let Err(e) = env.throw_new(exception_class(&err), err.to_string()) {
                tracing::error!(error = %e, "failed to raise Java exception");
            }
            fallback
        }
    }
}

fn read_string(env: &mut JNIEnv<'_>, value: &JString<'_>) -> Result<String> {
    Ok(env
        .get_string(value)
        .map_err(|e| jni_err("get_string", e))?
        .into())
}

fn new_string(env: &mut JNIEnv<'_>, value: &str) -> Result<jstring> {
    Ok(env
        .new_string(value)
        .map_err(|e| jni_err("new_string", e))?
        .into_raw())
}

fn to_jint(value: usize) -> Result<jint> {
    jint::try_from(value).map_err(|_| CoastersError::Bridge(format!("{value} exceeds jint")))
}

/// Resolve a packed handle to its arena and slot, then read through it.
fn with_slot<T>(handle: jlong, read: impl FnOnce(&Arena, Slot) -> Result<T>) -> Result<T> {
    let (key, slot) = unpack(handle);
    let arena = ARENAS.get(key)?;
    read(&arena, slot)
}

fn read_category<T>(handle: jlong, read: impl FnOnce(CategoryHandle<'_>) -> Result<T>) -> Result<T> {
    with_slot(handle, |arena, slot| read(CategoryHandle::from_slot(arena, slot)))
}

fn category_string(
    env: &mut JNIEnv<'_>,
    handle: jlong,
    field: impl FnOnce(CategoryHandle<'_>) -> Result<String>,
) -> jstring {
    guard(env, std::ptr::null_mut(), |env| {
        let value = read_category(handle, field)?;
        new_string(env, &value)
    })
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_configure<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    base_url: JString<'local>,
) -> jboolean {
    guard(&mut env, 0, |env| {
        let base_url = read_string(env, &base_url)?;
        SERVICE.configure(&base_url)?;
        Ok(1)
    })
}

// ---------------------------------------------------------------------------
// Arenas
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_openArena<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    confined: jboolean,
) -> jlong {
    let scope = if confined != 0 {
        ArenaScope::Confined
    } else {
        ArenaScope::Auto
    };
    guard(&mut env, 0, |_| ARENAS.open(scope).map(jlong::from))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_closeArena<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    arena: jlong,
) -> jboolean {
    guard(&mut env, 0, |_| Ok(jboolean::from(ARENAS.close(arena_key(arena)?))))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_releaseArena<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    arena: jlong,
) -> jboolean {
    guard(&mut env, 0, |_| Ok(jboolean::from(ARENAS.release(arena_key(arena)?))))
}

// ---------------------------------------------------------------------------
// Fetch into handles
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_fetchAll<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    arena: jlong,
) -> jlong {
    guard(&mut env, 0, |_| {
        let key = arena_key(arena)?;
        let arena = ARENAS.get(key)?;
        let handle = service()?.fetch_all_handle(&arena)?;
        Ok(pack(key, handle.slot()))
    })
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_search<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    arena: jlong,
    name: JString<'local>,
) -> jlong {
    guard(&mut env, 0, |env| {
        let name = read_string(env, &name)?;
        let key = arena_key(arena)?;
        let arena = ARENAS.get(key)?;
        let handle = service()?.search_handle(&name, &arena)?;
        Ok(pack(key, handle.slot()))
    })
}

// ---------------------------------------------------------------------------
// Catalog handles
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_catalogCount<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    catalog: jlong,
) -> jint {
    guard(&mut env, 0, |_| {
        with_slot(catalog, |arena, slot| {
            to_jint(CatalogHandle::from_slot(arena, slot).count()?)
        })
    })
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_categoryAt<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    catalog: jlong,
    index: jint,
) -> jlong {
    guard(&mut env, 0, |_| {
        let (key, _) = unpack(catalog);
        with_slot(catalog, |arena, slot| {
            let category = CatalogHandle::from_slot(arena, slot).category_at_signed(index.into())?;
            Ok(pack(key, category.slot()))
        })
    })
}

// ---------------------------------------------------------------------------
// Category handles
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_categorySlug<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    category: jlong,
) -> jstring {
    category_string(&mut env, category, |c| c.slug())
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_categoryName<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    category: jlong,
) -> jstring {
    category_string(&mut env, category, |c| c.name())
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_categoryConstruction<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    category: jlong,
) -> jstring {
    category_string(&mut env, category, |c| c.construction())
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_categorySourceUrl<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    category: jlong,
) -> jstring {
    category_string(&mut env, category, |c| c.source_url())
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_categoryImageUrl<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    category: jlong,
) -> jstring {
    category_string(&mut env, category, |c| c.image_url())
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_prebuiltDesignCount<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    category: jlong,
) -> jint {
    guard(&mut env, 0, |_| {
        read_category(category, |c| to_jint(c.prebuilt_design_count()?))
    })
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_prebuiltDesignAt<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    category: jlong,
    index: jint,
) -> jstring {
    category_string(&mut env, category, |c| {
        c.prebuilt_design_at_signed(index.into())
    })
}

// ---------------------------------------------------------------------------
// JSON surface
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_fetchAllJson<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    guard(&mut env, std::ptr::null_mut(), |env| {
        let service = service()?;
        let json = coasters_client::block_on(service.fetch_all_json())??;
        new_string(env, &json)
    })
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_searchJson<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    name: JString<'local>,
) -> jstring {
    guard(&mut env, std::ptr::null_mut(), |env| {
        let name = read_string(env, &name)?;
        let service = service()?;
        let json = coasters_client::block_on(service.search_json(&name))??;
        new_string(env, &json)
    })
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_fetchAllJsonOrEmpty<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    guard(&mut env, std::ptr::null_mut(), |env| {
        let json = service()?.fetch_all_json_or_empty();
        new_string(env, &json)
    })
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_coasters_bridge_NativeCatalog_searchJsonOrEmpty<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    name: JString<'local>,
) -> jstring {
    guard(&mut env, std::ptr::null_mut(), |env| {
        let name = read_string(env, &name)?;
        let json = service()?.search_json_or_empty(&name);
        new_string(env, &json)
    })
}
