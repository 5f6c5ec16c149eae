//! Class table and per-class property registry
//!
//! Classes start *unregistered*. The first declaration on a class, or the
//! first property lookup through a class whose ancestor is registered, gives
//! it its own collection; there is no way back.
//!
//! A registered class keeps the properties it declared itself (`own`) and a
//! cached effective collection: the nearest registered ancestor's effective
//! collection with `own` merged over it. Declaring on a class recomputes the
//! cache for it and for every registered descendant, so subclasses that
//! already exist see late declarations too.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::accessor::{GetterFn, GetterNext, SetterFn, SetterNext};
use crate::base::BaseConstructor;
use crate::collection::PropertyCollection;
use crate::error::PropertyError;
use crate::ids::ClassId;
use crate::initializer::{self, Arguments, InitPlan};
use crate::instance::Instance;
use crate::property::{Property, PropertyOptions};
use crate::settings::{LateDeclarationPolicy, RegistrySettings};
use crate::value::Value;

struct Registration {
    own: PropertyCollection,
    effective: Arc<PropertyCollection>,
}

struct ClassEntry {
    name: String,
    parent: Option<ClassId>,
    children: Vec<ClassId>,
    base: Option<Arc<dyn BaseConstructor>>,
    registration: Option<Registration>,
    getters: HashMap<String, Arc<GetterFn>>,
    setters: HashMap<String, Arc<SetterFn>>,
    instantiated: bool,
}

impl ClassEntry {
    fn new(name: String, parent: Option<ClassId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            base: None,
            registration: None,
            getters: HashMap::new(),
            setters: HashMap::new(),
            instantiated: false,
        }
    }
}

#[derive(Default)]
struct RegistryState {
    classes: HashMap<ClassId, ClassEntry>,
    names: HashMap<String, ClassId>,
    settings: RegistrySettings,
}

impl RegistryState {
    fn entry(&self, class: ClassId) -> Result<&ClassEntry, PropertyError> {
        self.classes
            .get(&class)
            .ok_or(PropertyError::UnknownClass(class))
    }

    fn entry_mut(&mut self, class: ClassId) -> Result<&mut ClassEntry, PropertyError> {
        self.classes
            .get_mut(&class)
            .ok_or(PropertyError::UnknownClass(class))
    }

    /// `class` followed by its ancestors, nearest first
    fn lineage(&self, class: ClassId) -> Vec<ClassId> {
        let mut lineage = Vec::new();
        let mut current = Some(class);
        while let Some(id) = current {
            match self.classes.get(&id) {
                Some(entry) => {
                    lineage.push(id);
                    current = entry.parent;
                }
                None => break,
            }
        }
        lineage
    }

    fn nearest_registered(&self, class: ClassId) -> Option<&Registration> {
        self.lineage(class)
            .into_iter()
            .find_map(|id| self.classes.get(&id)?.registration.as_ref())
    }

    fn participates(&self, class: ClassId) -> bool {
        self.nearest_registered(class).is_some()
    }

    /// Effective collection without registering anything. An unregistered
    /// class sees exactly what its nearest registered ancestor sees.
    fn effective(&self, class: ClassId) -> Option<Arc<PropertyCollection>> {
        self.nearest_registered(class)
            .map(|registration| Arc::clone(&registration.effective))
    }

    fn inherited(&self, class: ClassId) -> Option<Arc<PropertyCollection>> {
        let parent = self.classes.get(&class)?.parent?;
        self.effective(parent)
    }

    fn register(&mut self, class: ClassId) -> Result<Arc<PropertyCollection>, PropertyError> {
        if let Some(registration) = &self.entry(class)?.registration {
            return Ok(Arc::clone(&registration.effective));
        }

        let effective = Arc::new(
            self.inherited(class)
                .map(|parent| PropertyCollection::merge_from(&parent))
                .unwrap_or_default(),
        );
        let entry = self.entry_mut(class)?;
        entry.registration = Some(Registration {
            own: PropertyCollection::new(),
            effective: Arc::clone(&effective),
        });
        debug!(
            class = %entry.name,
            inherited = effective.len(),
            "Registered property collection"
        );
        Ok(effective)
    }

    fn refresh(&mut self, class: ClassId) {
        let inherited = self.inherited(class);
        let Some(entry) = self.classes.get_mut(&class) else {
            return;
        };
        if let Some(registration) = entry.registration.as_mut() {
            let merged = match &inherited {
                Some(parent) => parent.merged_with(&registration.own),
                None => registration.own.clone(),
            };
            registration.effective = Arc::new(merged);
        }
        let children = entry.children.clone();
        for child in children {
            self.refresh(child);
        }
    }

    fn has_instances(&self, class: ClassId) -> bool {
        self.classes.get(&class).is_some_and(|entry| {
            entry.instantiated || entry.children.iter().any(|&child| self.has_instances(child))
        })
    }

    fn require_property(&self, class: ClassId, name: &str) -> Result<(), PropertyError> {
        let entry = self.entry(class)?;
        match self.effective(class) {
            None => Err(PropertyError::NotParticipating(entry.name.clone())),
            Some(collection) if !collection.contains(name) => {
                Err(PropertyError::unknown_property(&entry.name, name))
            }
            Some(_) => Ok(()),
        }
    }

    fn base_constructor(&self, class: ClassId) -> Option<Arc<dyn BaseConstructor>> {
        self.lineage(class)
            .into_iter()
            .find_map(|id| self.classes.get(&id)?.base.clone())
    }

    fn getter_chain(&self, class: ClassId, name: &str) -> Vec<Arc<GetterFn>> {
        self.lineage(class)
            .into_iter()
            .filter_map(|id| self.classes.get(&id)?.getters.get(name).cloned())
            .collect()
    }

    fn setter_chain(&self, class: ClassId, name: &str) -> Vec<Arc<SetterFn>> {
        self.lineage(class)
            .into_iter()
            .filter_map(|id| self.classes.get(&id)?.setters.get(name).cloned())
            .collect()
    }
}

/// Shared handle to a class table and its property collections.
///
/// Cloning is cheap; clones see the same classes. Instances keep a handle so
/// their accessors always resolve against the current declarations.
///
/// # Example
///
/// ```
/// use propdecl::{Arguments, PropertyOptions, Registry};
///
/// let registry = Registry::new();
/// let section = registry.define_class("Section", None).unwrap();
/// registry.declare(section, "title", PropertyOptions::new().required(true)).unwrap();
///
/// let instance = registry
///     .instantiate(section, Arguments::new().keyword("title", "Intro"))
///     .unwrap();
/// assert_eq!(instance.get("title"), Some("Intro".into()));
///
/// assert!(registry.instantiate(section, Arguments::new()).is_err());
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    state: Arc<RwLock<RegistryState>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Registry");
        if let Some(state) = self.state.try_read() {
            debug
                .field("classes", &state.classes.len())
                .field("settings", &state.settings);
        }
        debug.finish_non_exhaustive()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: RegistrySettings) -> Self {
        let registry = Self::default();
        registry.state.write().settings = settings;
        registry
    }

    pub fn settings(&self) -> RegistrySettings {
        self.state.read().settings
    }

    // =========================================================================
    // Class table
    // =========================================================================

    /// Define a class, optionally deriving from `parent`.
    ///
    /// # Errors
    ///
    /// - `DuplicateClass` if the name is taken
    /// - `UnknownClass` if `parent` is not defined
    pub fn define_class(
        &self,
        name: impl Into<String>,
        parent: Option<ClassId>,
    ) -> Result<ClassId, PropertyError> {
        let name = name.into();
        let mut state = self.state.write();
        if state.names.contains_key(&name) {
            return Err(PropertyError::DuplicateClass(name));
        }

        let id = ClassId::new();
        if let Some(parent) = parent {
            state.entry_mut(parent)?.children.push(id);
        }
        state.names.insert(name.clone(), id);
        state.classes.insert(id, ClassEntry::new(name.clone(), parent));
        debug!(class = %name, id = %id, "Defined class");
        Ok(id)
    }

    /// Attach construction behavior for a non-participating base class.
    pub fn set_base_constructor(
        &self,
        class: ClassId,
        base: impl BaseConstructor + 'static,
    ) -> Result<(), PropertyError> {
        let mut state = self.state.write();
        state.entry_mut(class)?.base = Some(Arc::new(base));
        Ok(())
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.state.read().names.get(name).copied()
    }

    pub fn class_name(&self, class: ClassId) -> Option<String> {
        self.state.read().classes.get(&class).map(|e| e.name.clone())
    }

    pub fn parent(&self, class: ClassId) -> Option<ClassId> {
        self.state.read().classes.get(&class)?.parent
    }

    /// True when `ancestor` is a strict ancestor of `class`
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        class != ancestor && self.state.read().lineage(class).contains(&ancestor)
    }

    // =========================================================================
    // Property collections
    // =========================================================================

    /// True when the class or one of its ancestors is registered
    pub fn participates(&self, class: ClassId) -> bool {
        self.state.read().participates(class)
    }

    /// Introspect the effective collection.
    ///
    /// `None` for classes with no registered ancestor; such classes are not
    /// registered by asking.
    pub fn properties(&self, class: ClassId) -> Option<Arc<PropertyCollection>> {
        let mut state = self.state.write();
        if !state.participates(class) {
            return None;
        }
        state.register(class).ok()
    }

    /// Effective collection of `class`, registering it if necessary.
    pub fn collection_for(&self, class: ClassId) -> Result<Arc<PropertyCollection>, PropertyError> {
        self.state.write().register(class)
    }

    /// Declare (or redeclare) a property on `class`.
    ///
    /// # Errors
    ///
    /// - `UnknownClass` if `class` is not defined
    /// - `DeclarationsSealed` if late declarations are rejected and the class
    ///   or a descendant already has instances
    pub fn declare(
        &self,
        class: ClassId,
        name: impl Into<String>,
        options: PropertyOptions,
    ) -> Result<Arc<Property>, PropertyError> {
        let name = name.into();
        let mut state = self.state.write();
        let class_name = state.entry(class)?.name.clone();

        if state.settings.late_declarations == LateDeclarationPolicy::Reject
            && state.has_instances(class)
        {
            return Err(PropertyError::DeclarationsSealed {
                class: class_name,
                property: name,
            });
        }

        state.register(class)?;
        let Some(registration) = state.entry_mut(class)?.registration.as_mut() else {
            return Err(PropertyError::NotParticipating(class_name));
        };
        let redeclared = registration.own.contains(&name);
        let property = registration.own.declare(name, options);
        state.refresh(class);

        if redeclared {
            debug!(class = %class_name, property = property.name(), "Property redeclared");
        } else {
            debug!(class = %class_name, property = property.name(), "Property declared");
        }
        Ok(property)
    }

    // =========================================================================
    // Accessor overrides
    // =========================================================================

    /// Layer a getter in front of `name` for `class` and its descendants.
    ///
    /// The override reaches the layer below through `next.get(instance)`.
    pub fn override_getter<F>(
        &self,
        class: ClassId,
        name: &str,
        getter: F,
    ) -> Result<(), PropertyError>
    where
        F: Fn(&Instance, GetterNext<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        let mut state = self.state.write();
        state.require_property(class, name)?;
        let getter: Arc<GetterFn> = Arc::new(getter);
        let entry = state.entry_mut(class)?;
        entry.getters.insert(name.to_string(), getter);
        debug!(class = %entry.name, property = name, "Getter overridden");
        Ok(())
    }

    /// Layer a setter in front of `name` for `class` and its descendants.
    ///
    /// The override stores through `next.set(instance, value)`; skipping it
    /// skips validation and storage.
    pub fn override_setter<F>(
        &self,
        class: ClassId,
        name: &str,
        setter: F,
    ) -> Result<(), PropertyError>
    where
        F: Fn(&mut Instance, Value, SetterNext<'_>) -> Result<(), PropertyError>
            + Send
            + Sync
            + 'static,
    {
        let mut state = self.state.write();
        state.require_property(class, name)?;
        let setter: Arc<SetterFn> = Arc::new(setter);
        let entry = state.entry_mut(class)?;
        entry.setters.insert(name.to_string(), setter);
        debug!(class = %entry.name, property = name, "Setter overridden");
        Ok(())
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Construct an instance of `class`.
    pub fn instantiate(
        &self,
        class: ClassId,
        arguments: Arguments,
    ) -> Result<Instance, PropertyError> {
        self.instantiate_with(class, arguments, |_| Ok(()))
    }

    /// Construct an instance of `class`, running `configure` once keyword and
    /// default values are in place. Assignments made by `configure` go through
    /// the normal setters.
    #[instrument(skip_all, fields(class = %class))]
    pub fn instantiate_with<F>(
        &self,
        class: ClassId,
        arguments: Arguments,
        configure: F,
    ) -> Result<Instance, PropertyError>
    where
        F: FnOnce(&mut Instance) -> Result<(), PropertyError>,
    {
        let plan = {
            let mut state = self.state.write();
            let class_name = state.entry(class)?.name.clone();
            let properties = if state.participates(class) {
                state.register(class)?
            } else {
                Arc::new(PropertyCollection::new())
            };
            let base = state.base_constructor(class);
            InitPlan {
                class_name,
                properties,
                base,
                unknown_keywords: state.settings.unknown_keywords,
            }
        };

        let mut instance = Instance::new(self.clone(), class, plan.class_name.clone());
        initializer::initialize(&mut instance, plan, arguments, configure)?;
        self.state.write().entry_mut(class)?.instantiated = true;
        debug!(instance = %instance.id(), "Instance initialized");
        Ok(instance)
    }

    // =========================================================================
    // Lookups used by instances
    // =========================================================================

    pub(crate) fn effective(&self, class: ClassId) -> Option<Arc<PropertyCollection>> {
        self.state.read().effective(class)
    }

    pub(crate) fn getter_chain(&self, class: ClassId, name: &str) -> Option<Vec<Arc<GetterFn>>> {
        let state = self.state.read();
        if !state.effective(class)?.contains(name) {
            return None;
        }
        Some(state.getter_chain(class, name))
    }

    pub(crate) fn setter_chain(
        &self,
        class: ClassId,
        name: &str,
    ) -> Option<(Arc<Property>, Vec<Arc<SetterFn>>)> {
        let state = self.state.read();
        let property = Arc::clone(state.effective(class)?.get(name)?);
        Some((property, state.setter_chain(class, name)))
    }
}
