//! # Schema Registry
//!
//! Named, compiled schemas with one-byte type ids.
//!
//! ## Type ids
//!
//! Schemas that embed their type id own it: no other embedding schema can
//! take the same id. Without an explicit id a schema gets the lowest free
//! one, and a name that already owns an id keeps it when re-registered.
//!
//! ## References
//!
//! Named object references are resolved when the referring schema is
//! registered. Re-registering the referenced schema later does not change
//! schemas that already resolved it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::{decode, encode};
use crate::config::SerializerConfig;
use crate::error::{CodecError, CodecResult, RegistrationError, RegistrationResult};
use crate::schema::{max_encoded_size, parse_catalog, CompiledSchema, Compiler, SchemaDecl};
use crate::TYPE_KEY;

/// Per-registration options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Prefix payloads with the type id.
    pub serialize_type: bool,
    /// Explicit type id; the lowest free id otherwise.
    pub type_id: Option<u32>,
    /// Default output budget; the size estimate otherwise.
    pub max_bytes: Option<usize>,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            serialize_type: true,
            type_id: None,
            max_bytes: None,
        }
    }
}

impl RegisterOptions {
    /// Options with the configured `serialize_type` default.
    #[must_use]
    pub fn from_config(config: &SerializerConfig) -> Self {
        Self {
            serialize_type: config.serialize_type,
            ..Self::default()
        }
    }

    /// Sets an explicit type id.
    #[must_use]
    pub const fn with_type_id(mut self, type_id: u32) -> Self {
        self.type_id = Some(type_id);
        self
    }

    /// Sets the default output budget.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Leaves the type id out of payloads.
    #[must_use]
    pub const fn without_type(mut self) -> Self {
        self.serialize_type = false;
        self
    }
}

/// A registered schema.
#[derive(Clone, Debug)]
pub struct RegistryEntry {
    /// Registered name.
    pub name: String,
    /// Compiled schema.
    pub schema: Arc<CompiledSchema>,
    /// Type id. Only reserved when `embed_type` is set.
    pub type_id: u8,
    /// Payloads start with `type_id`.
    pub embed_type: bool,
    /// Default output budget, excluding the type id byte.
    pub max_encoded_size: usize,
}

/// Schemas by name and by type id.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    config: SerializerConfig,
    entries: HashMap<String, RegistryEntry>,
    type_ids: HashMap<u8, String>,
}

impl Registry {
    /// Creates an empty registry with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given limits.
    #[must_use]
    pub fn with_config(config: SerializerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Registry-wide limits.
    #[must_use]
    pub const fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Compiles and installs a schema, returning its type id.
    ///
    /// # Errors
    ///
    /// Returns error if the schema is invalid or its type id is unusable.
    /// Nothing is installed on error.
    pub fn register(
        &mut self,
        name: &str,
        decl: &SchemaDecl,
        options: RegisterOptions,
    ) -> RegistrationResult<u8> {
        self.resolve_type_id(name, &options)
            .and_then(|type_id| self.install(name, decl, &options, type_id))
            .map_err(|e| e.in_schema(name))
    }

    /// Registers a schema given as JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the value is not a valid schema.
    pub fn register_value(
        &mut self,
        name: &str,
        schema: &Value,
        options: RegisterOptions,
    ) -> RegistrationResult<u8> {
        let decl = SchemaDecl::from_value(schema).map_err(|e| e.in_schema(name))?;
        self.register(name, &decl, options)
    }

    /// Registers several schemas at once.
    ///
    /// Type ids are assigned in the given order; an explicit `type_id` is
    /// the id of the first schema and the rest count up from it. Schemas may
    /// reference ones declared later in the batch. Either every schema is
    /// installed or none is.
    ///
    /// # Errors
    ///
    /// Returns the first failure, or `UnresolvedReferences` for schemas
    /// caught in a reference cycle.
    pub fn register_batch(
        &mut self,
        decls: &[(String, SchemaDecl)],
        options: RegisterOptions,
    ) -> RegistrationResult<Vec<(String, u8)>> {
        let mut staged = self.clone();

        let mut type_ids = Vec::with_capacity(decls.len());
        for (offset, (name, _)) in decls.iter().enumerate() {
            let opts = batch_options(&options, offset);
            let type_id = staged
                .resolve_type_id(name, &opts)
                .map_err(|e| e.in_schema(name))?;
            if opts.serialize_type {
                staged.type_ids.insert(type_id, name.clone());
            }
            type_ids.push(type_id);
        }

        for index in compile_order(decls)? {
            let (name, decl) = &decls[index];
            let opts = batch_options(&options, index);
            staged
                .install(name, decl, &opts, type_ids[index])
                .map_err(|e| e.in_schema(name))?;
        }

        *self = staged;
        Ok(decls
            .iter()
            .map(|(name, _)| name.clone())
            .zip(type_ids)
            .collect())
    }

    /// Registers a JSON catalogue `{ "Name": { ...schema }, ... }`.
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or any schema fails.
    pub fn register_catalog_json(
        &mut self,
        text: &str,
        options: RegisterOptions,
    ) -> RegistrationResult<Vec<(String, u8)>> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| RegistrationError::InvalidCatalog(e.to_string()))?;
        self.register_batch(&parse_catalog(&value)?, options)
    }

    /// Registers a TOML catalogue, one table per schema.
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed or any schema fails.
    pub fn register_catalog_toml(
        &mut self,
        text: &str,
        options: RegisterOptions,
    ) -> RegistrationResult<Vec<(String, u8)>> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| RegistrationError::InvalidCatalog(e.to_string()))?;
        let value = serde_json::to_value(table)
            .map_err(|e| RegistrationError::InvalidCatalog(e.to_string()))?;
        self.register_batch(&parse_catalog(&value)?, options)
    }

    /// Compiled schema by name.
    #[must_use]
    pub fn get_schema(&self, name: &str) -> Option<&CompiledSchema> {
        self.entries.get(name).map(|entry| entry.schema.as_ref())
    }

    /// Entry by name.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    /// Entry owning an embedded type id.
    #[must_use]
    pub fn entry_for_type_id(&self, type_id: u8) -> Option<&RegistryEntry> {
        self.type_ids
            .get(&type_id)
            .and_then(|name| self.entries.get(name))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes a JSON value with the named schema.
    ///
    /// `max_bytes` bounds the payload, not counting the type id byte, and
    /// defaults to the schema's size estimate.
    ///
    /// # Errors
    ///
    /// Returns error if no schema has this name.
    pub fn to_binary(&self, data: &Value, name: &str, max_bytes: Option<usize>) -> CodecResult<Vec<u8>> {
        let entry = self.lookup(name)?;
        let payload = encode(&entry.schema, data, max_bytes.unwrap_or(entry.max_encoded_size));

        if payload.len() >= self.config.max_buffer_length {
            warn!(
                schema = name,
                len = payload.len(),
                max_buffer_length = self.config.max_buffer_length,
                "Max buffer length reached, consider raising max_buffer_length"
            );
        }

        if !entry.embed_type {
            return Ok(payload);
        }
        let mut framed = Vec::with_capacity(payload.len() + 1);
        framed.push(entry.type_id);
        framed.extend_from_slice(&payload);
        Ok(framed)
    }

    /// Encodes any serializable value with the named schema.
    ///
    /// # Errors
    ///
    /// Returns error if no schema has this name or the value does not
    /// convert to JSON.
    pub fn serialize<T: Serialize + ?Sized>(
        &self,
        value: &T,
        name: &str,
        max_bytes: Option<usize>,
    ) -> CodecResult<Vec<u8>> {
        let data = serde_json::to_value(value)?;
        self.to_binary(&data, name, max_bytes)
    }

    /// Decodes bytes into a JSON object.
    ///
    /// Without a name the leading byte selects the schema and the result
    /// carries its name under `"_type"`.
    ///
    /// # Errors
    ///
    /// Returns error if the schema cannot be determined or the leading type
    /// id does not match the named schema.
    pub fn to_json(&self, bytes: &[u8], name: Option<&str>) -> CodecResult<Value> {
        let Some(name) = name else {
            let (&type_id, payload) = bytes.split_first().ok_or(CodecError::MissingTypeId)?;
            let entry = self
                .entry_for_type_id(type_id)
                .ok_or(CodecError::UnknownTypeId(type_id))?;
            let mut fields = decode(&entry.schema, payload);
            fields.insert(TYPE_KEY.to_string(), Value::String(entry.name.clone()));
            return Ok(Value::Object(fields));
        };

        let entry = self.lookup(name)?;
        let payload = match (entry.embed_type, bytes.split_first()) {
            (true, Some((&found, rest))) => {
                if found != entry.type_id {
                    return Err(CodecError::TypeMismatch {
                        schema: name.to_string(),
                        expected: entry.type_id,
                        found,
                    });
                }
                rest
            }
            _ => bytes,
        };
        Ok(Value::Object(decode(&entry.schema, payload)))
    }

    /// Decodes bytes into any deserializable value.
    ///
    /// # Errors
    ///
    /// Returns error if decoding fails or the JSON does not fit `T`.
    pub fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8], name: Option<&str>) -> CodecResult<T> {
        let value = self.to_json(bytes, name)?;
        Ok(serde_json::from_value(value)?)
    }

    fn lookup(&self, name: &str) -> CodecResult<&RegistryEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| CodecError::UnknownSchema(name.to_string()))
    }

    fn resolve_type_id(&self, name: &str, options: &RegisterOptions) -> RegistrationResult<u8> {
        if let Some(requested) = options.type_id {
            match u8::try_from(requested) {
                Ok(type_id) if options.serialize_type => {
                    if let Some(owner) = self.type_ids.get(&type_id).filter(|owner| *owner != name) {
                        return Err(RegistrationError::TypeIdInUse {
                            type_id,
                            owner: owner.clone(),
                        });
                    }
                    return Ok(type_id);
                }
                Ok(type_id) => return Ok(type_id),
                Err(_) if options.serialize_type => {
                    return Err(RegistrationError::TypeIdOutOfRange(requested));
                }
                Err(_) => {
                    debug!(schema = name, type_id = requested, "Ignoring out of range typeId on a schema that does not embed it");
                }
            }
        }

        if let Some(existing) = self.entries.get(name).filter(|e| e.embed_type) {
            return Ok(existing.type_id);
        }

        match (0..=u8::MAX).find(|id| !self.type_ids.contains_key(id)) {
            Some(type_id) => Ok(type_id),
            None if options.serialize_type => Err(RegistrationError::TypeIdsExhausted),
            None => Ok(0),
        }
    }

    fn install(
        &mut self,
        name: &str,
        decl: &SchemaDecl,
        options: &RegisterOptions,
        type_id: u8,
    ) -> RegistrationResult<u8> {
        let compiled = {
            let entries = &self.entries;
            let lookup = |reference: &str| entries.get(reference).map(|e| Arc::clone(&e.schema));
            Compiler::new(&self.config, &lookup).compile(decl)?
        };
        let max_encoded_size = options
            .max_bytes
            .unwrap_or_else(|| max_encoded_size(&compiled, &self.config));

        if let Some(previous) = self.entries.get(name) {
            let owns_slot = self
                .type_ids
                .get(&previous.type_id)
                .is_some_and(|owner| owner == name);
            if previous.embed_type && owns_slot && (!options.serialize_type || previous.type_id != type_id) {
                self.type_ids.remove(&previous.type_id);
            }
        }
        if options.serialize_type {
            self.type_ids.insert(type_id, name.to_string());
        }

        debug!(
            schema = name,
            type_id,
            embed_type = options.serialize_type,
            max_encoded_size,
            fields = compiled.len(),
            "Registered schema"
        );

        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                name: name.to_string(),
                schema: Arc::new(compiled),
                type_id,
                embed_type: options.serialize_type,
                max_encoded_size,
            },
        );
        Ok(type_id)
    }
}

fn batch_options(options: &RegisterOptions, offset: usize) -> RegisterOptions {
    RegisterOptions {
        type_id: options
            .type_id
            .map(|base| base.saturating_add(u32::try_from(offset).unwrap_or(u32::MAX))),
        ..*options
    }
}

/// Orders batch entries so every schema comes after the batch schemas it
/// references (Kahn's algorithm, declaration order among equals).
fn compile_order(decls: &[(String, SchemaDecl)]) -> RegistrationResult<Vec<usize>> {
    let positions: HashMap<&str, usize> = decls
        .iter()
        .enumerate()
        .map(|(index, (name, _))| (name.as_str(), index))
        .collect();

    let mut in_degree = vec![0usize; decls.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); decls.len()];
    for (index, (name, decl)) in decls.iter().enumerate() {
        for reference in decl.references() {
            if reference == *name {
                continue;
            }
            if let Some(&dependency) = positions.get(reference.as_str()) {
                dependents[dependency].push(index);
                in_degree[index] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..decls.len()).filter(|i| in_degree[*i] == 0).collect();
    let mut order = Vec::with_capacity(decls.len());
    while let Some(index) = queue.pop_front() {
        order.push(index);
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() < decls.len() {
        let stuck = (0..decls.len())
            .filter(|i| in_degree[*i] > 0)
            .map(|i| decls[i].0.clone())
            .collect();
        return Err(RegistrationError::UnresolvedReferences(stuck));
    }
    Ok(order)
}

/// A registry shared between threads.
///
/// Registration takes the write lock; encoding and decoding take read
/// locks and run concurrently.
#[derive(Clone, Debug, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    /// Wraps an existing registry.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Read access for several calls under one lock.
    pub fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read()
    }

    /// Write access for several calls under one lock.
    pub fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write()
    }

    /// See [`Registry::register`].
    ///
    /// # Errors
    ///
    /// Returns error if the schema is invalid.
    pub fn register(&self, name: &str, decl: &SchemaDecl, options: RegisterOptions) -> RegistrationResult<u8> {
        self.inner.write().register(name, decl, options)
    }

    /// See [`Registry::register_batch`].
    ///
    /// # Errors
    ///
    /// Returns error if any schema is invalid.
    pub fn register_batch(
        &self,
        decls: &[(String, SchemaDecl)],
        options: RegisterOptions,
    ) -> RegistrationResult<Vec<(String, u8)>> {
        self.inner.write().register_batch(decls, options)
    }

    /// See [`Registry::to_binary`].
    ///
    /// # Errors
    ///
    /// Returns error if no schema has this name.
    pub fn to_binary(&self, data: &Value, name: &str, max_bytes: Option<usize>) -> CodecResult<Vec<u8>> {
        self.inner.read().to_binary(data, name, max_bytes)
    }

    /// See [`Registry::to_json`].
    ///
    /// # Errors
    ///
    /// Returns error if the schema cannot be determined.
    pub fn to_json(&self, bytes: &[u8], name: Option<&str>) -> CodecResult<Value> {
        self.inner.read().to_json(bytes, name)
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decl(value: Value) -> SchemaDecl {
        SchemaDecl::from_value(&value).unwrap()
    }

    #[test]
    fn test_type_ids_count_up() {
        let mut registry = Registry::new();
        let a = registry.register("A", &decl(json!({"x": "uint8"})), RegisterOptions::default());
        let b = registry.register("B", &decl(json!({"x": "uint8"})), RegisterOptions::default());
        assert_eq!(a, Ok(0));
        assert_eq!(b, Ok(1));
        assert_eq!(registry.entry_for_type_id(1).map(|e| e.name.as_str()), Some("B"));
    }

    #[test]
    fn test_reregister_keeps_type_id() {
        let mut registry = Registry::new();
        registry.register("A", &decl(json!({"x": "uint8"})), RegisterOptions::default()).unwrap();
        registry.register("B", &decl(json!({"x": "uint8"})), RegisterOptions::default()).unwrap();
        let again = registry.register("A", &decl(json!({"y": "uint16"})), RegisterOptions::default());
        assert_eq!(again, Ok(0));
        assert!(registry.get_schema("A").unwrap().field("y").is_some());
    }

    #[test]
    fn test_type_id_conflict() {
        let mut registry = Registry::new();
        registry
            .register("A", &decl(json!({"x": "uint8"})), RegisterOptions::default().with_type_id(5))
            .unwrap();
        let err = registry
            .register("B", &decl(json!({"x": "uint8"})), RegisterOptions::default().with_type_id(5))
            .unwrap_err();
        assert_eq!(
            err.root_cause(),
            &RegistrationError::TypeIdInUse {
                type_id: 5,
                owner: "A".into()
            }
        );
        assert!(registry.entry("B").is_none());
    }

    #[test]
    fn test_type_id_range_only_matters_when_embedded() {
        let mut registry = Registry::new();
        let err = registry
            .register("A", &decl(json!({"x": "uint8"})), RegisterOptions::default().with_type_id(300))
            .unwrap_err();
        assert_eq!(err.root_cause(), &RegistrationError::TypeIdOutOfRange(300));

        let ok = registry.register(
            "A",
            &decl(json!({"x": "uint8"})),
            RegisterOptions::default().with_type_id(300).without_type(),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_failed_register_keeps_previous_entry() {
        let mut registry = Registry::new();
        registry.register("A", &decl(json!({"x": "uint8"})), RegisterOptions::default()).unwrap();
        let err = registry.register_value("A", &json!({"x": "nope"}), RegisterOptions::default());
        assert!(err.is_err());
        assert!(registry.get_schema("A").unwrap().field("x").is_some());
    }

    #[test]
    fn test_type_ids_exhausted() {
        let mut registry = Registry::new();
        for i in 0..256 {
            registry
                .register(&format!("S{i}"), &decl(json!({"x": "uint8"})), RegisterOptions::default())
                .unwrap();
        }
        let err = registry
            .register("Extra", &decl(json!({"x": "uint8"})), RegisterOptions::default())
            .unwrap_err();
        assert_eq!(err.root_cause(), &RegistrationError::TypeIdsExhausted);
    }

    #[test]
    fn test_batch_forward_reference() {
        let mut registry = Registry::new();
        let decls = vec![
            ("Car".to_string(), decl(json!({"p": [{"type": "object", "schema": "Passenger"}]}))),
            ("Passenger".to_string(), decl(json!({"name": "string"}))),
        ];
        let ids = registry.register_batch(&decls, RegisterOptions::default()).unwrap();
        assert_eq!(ids, [("Car".to_string(), 0), ("Passenger".to_string(), 1)]);
    }

    #[test]
    fn test_batch_cycle_is_atomic() {
        let mut registry = Registry::new();
        let decls = vec![
            ("Ok".to_string(), decl(json!({"x": "uint8"}))),
            ("A".to_string(), decl(json!({"b": {"type": "object", "schema": "B"}}))),
            ("B".to_string(), decl(json!({"a": {"type": "object", "schema": "A"}}))),
        ];
        let err = registry.register_batch(&decls, RegisterOptions::default()).unwrap_err();
        assert_eq!(err, RegistrationError::UnresolvedReferences(vec!["A".into(), "B".into()]));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_batch_explicit_base_id() {
        let mut registry = Registry::new();
        let decls = vec![
            ("A".to_string(), decl(json!({"x": "uint8"}))),
            ("B".to_string(), decl(json!({"x": "uint8"}))),
        ];
        let ids = registry
            .register_batch(&decls, RegisterOptions::default().with_type_id(10))
            .unwrap();
        assert_eq!(ids[1].1, 11);
    }

    #[test]
    fn test_round_trip_with_type_key() {
        let mut registry = Registry::new();
        registry
            .register_value("Ping", &json!({"time": "uint32"}), RegisterOptions::default())
            .unwrap();
        let bytes = registry.to_binary(&json!({"time": 7}), "Ping", None).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 7]);
        assert_eq!(
            registry.to_json(&bytes, None).unwrap(),
            json!({"time": 7, "_type": "Ping"})
        );
        assert_eq!(registry.to_json(&bytes, Some("Ping")).unwrap(), json!({"time": 7}));
    }

    #[test]
    fn test_decode_errors() {
        let mut registry = Registry::new();
        registry.register_value("A", &json!({"x": "uint8"}), RegisterOptions::default()).unwrap();
        registry.register_value("B", &json!({"x": "uint8"}), RegisterOptions::default()).unwrap();

        assert!(matches!(registry.to_json(&[], None), Err(CodecError::MissingTypeId)));
        assert!(matches!(registry.to_json(&[9, 1], None), Err(CodecError::UnknownTypeId(9))));
        assert!(matches!(registry.to_json(&[0], Some("Nope")), Err(CodecError::UnknownSchema(_))));
        assert!(matches!(
            registry.to_json(&[1, 5], Some("A")),
            Err(CodecError::TypeMismatch { expected: 0, found: 1, .. })
        ));
        assert!(matches!(
            registry.to_binary(&json!({}), "Nope", None),
            Err(CodecError::UnknownSchema(_))
        ));
    }

    #[test]
    fn test_snapshot_reference() {
        let mut registry = Registry::new();
        registry.register_value("Inner", &json!({"a": "uint8"}), RegisterOptions::default()).unwrap();
        registry
            .register_value("Outer", &json!({"i": {"type": "object", "schema": "Inner"}}), RegisterOptions::default())
            .unwrap();
        registry
            .register_value("Inner", &json!({"a": "uint32"}), RegisterOptions::default())
            .unwrap();

        let bytes = registry
            .to_binary(&json!({"i": {"a": 3}}), "Outer", None)
            .unwrap();
        assert_eq!(bytes, vec![1, 3]);
    }

    #[test]
    fn test_max_bytes_option_sets_default_budget() {
        let mut registry = Registry::new();
        registry
            .register_value(
                "A",
                &json!({"a": "uint8", "b": "uint8"}),
                RegisterOptions::default().with_max_bytes(1).without_type(),
            )
            .unwrap();
        assert_eq!(registry.to_binary(&json!({"a": 1, "b": 2}), "A", None).unwrap(), vec![1]);
        assert_eq!(registry.to_binary(&json!({"a": 1, "b": 2}), "A", Some(2)).unwrap(), vec![1, 2]);
    }
}
