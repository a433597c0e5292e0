// 宿主方法目录：已加载类、声明方法/构造函数与原始函数体
// 类可被卸载，卸载后由其解析出的 TargetHandle 失效
use crate::errno::Thrown;
use crate::log;
use crate::runtime::CallFrame;
use crate::runtime::state::RwLockPoisonRecover;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

// 方法修饰符位，取值与 JVM access flags 一致
pub const MODIFIER_PUBLIC: u32 = 0x0001;
pub const MODIFIER_PRIVATE: u32 = 0x0002;
pub const MODIFIER_PROTECTED: u32 = 0x0004;
pub const MODIFIER_STATIC: u32 = 0x0008;
pub const MODIFIER_FINAL: u32 = 0x0010;
pub const MODIFIER_SYNCHRONIZED: u32 = 0x0020;
pub const MODIFIER_NATIVE: u32 = 0x0100;
pub const MODIFIER_ABSTRACT: u32 = 0x0400;

pub const RETURN_VOID: &str = "void";

// 构造函数在目录中的名称
pub const CONSTRUCTOR_NAME: &str = "<init>";

// 原始函数体；接收者与参数从调用帧读取
pub type MethodBody = Arc<dyn Fn(&CallFrame) -> Result<Value, Thrown> + Send + Sync>;

pub struct MethodDef {
    name: String,
    params: Vec<String>,
    return_type: String,
    modifiers: u32,
    body: MethodBody,
}

impl MethodDef {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&CallFrame) -> Result<Value, Thrown> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_type: RETURN_VOID.to_string(),
            modifiers: MODIFIER_PUBLIC,
            body: Arc::new(body),
        }
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn returns(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    pub fn modifiers(mut self, modifiers: u32) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_types(&self) -> &[String] {
        &self.params
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn modifier_bits(&self) -> u32 {
        self.modifiers
    }

    pub fn is_static(&self) -> bool {
        self.modifiers & MODIFIER_STATIC != 0
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub(crate) fn body(&self) -> &MethodBody {
        &self.body
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field("modifiers", &format_args!("0x{:x}", self.modifiers))
            .finish()
    }
}

// 构造函数：参数类型 + 函数体，函数体返回新建的实例
pub struct ConstructorDef {
    inner: MethodDef,
}

impl ConstructorDef {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&CallFrame) -> Result<Value, Thrown> + Send + Sync + 'static,
    {
        Self {
            inner: MethodDef::new(CONSTRUCTOR_NAME, body),
        }
    }

    pub fn params<I, S>(self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: self.inner.params(params),
        }
    }

    pub fn modifiers(self, modifiers: u32) -> Self {
        Self {
            inner: self.inner.modifiers(modifiers & !MODIFIER_STATIC),
        }
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("params", &self.inner.params)
            .field("modifiers", &format_args!("0x{:x}", self.inner.modifiers))
            .finish()
    }
}

#[derive(Debug)]
pub struct ClassDef {
    name: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    methods: Vec<Arc<MethodDef>>,
    constructors: Vec<Arc<MethodDef>>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    // 声明顺序即 add 顺序，解析时的决胜规则依赖该顺序
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    pub fn constructor(mut self, constructor: ConstructorDef) -> Self {
        self.constructors.push(Arc::new(constructor.inner));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn methods(&self) -> &[Arc<MethodDef>] {
        &self.methods
    }

    pub fn constructors(&self) -> &[Arc<MethodDef>] {
        &self.constructors
    }
}

// 一次加载实例；同名类重新加载会得到新的 instance_id
#[derive(Debug)]
pub(crate) struct LoadedClass {
    pub(crate) instance_id: u64,
    pub(crate) def: ClassDef,
}

// 类成员：声明方法或构造函数的下标
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Member {
    Method(usize),
    Constructor(usize),
}

// 目标唯一标识：类加载实例 + 成员
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TargetId {
    pub class_instance: u64,
    pub member: Member,
}

// 已解析的可拦截方法或构造函数，只读视图，不拥有宿主状态
#[derive(Clone)]
pub struct TargetHandle {
    id: TargetId,
    class_name: Arc<str>,
    method: Arc<MethodDef>,
    class: Weak<LoadedClass>,
}

impl TargetHandle {
    pub(crate) fn new(class: &Arc<LoadedClass>, method_index: usize) -> Option<Self> {
        Self::for_member(class, Member::Method(method_index))
    }

    pub(crate) fn constructor(class: &Arc<LoadedClass>, index: usize) -> Option<Self> {
        Self::for_member(class, Member::Constructor(index))
    }

    fn for_member(class: &Arc<LoadedClass>, member: Member) -> Option<Self> {
        let method = match member {
            Member::Method(index) => class.def.methods.get(index)?,
            Member::Constructor(index) => class.def.constructors.get(index)?,
        };
        Some(Self {
            id: TargetId {
                class_instance: class.instance_id,
                member,
            },
            class_name: Arc::from(class.def.name.as_str()),
            method: Arc::clone(method),
            class: Arc::downgrade(class),
        })
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method(&self) -> &MethodDef {
        &self.method
    }

    pub fn name(&self) -> &str {
        self.method.name()
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.id.member, Member::Constructor(_))
    }

    // 所属类仍处于加载状态
    pub fn is_available(&self) -> bool {
        self.class.strong_count() > 0
    }

    // Class#name(param,...)
    pub fn signature(&self) -> String {
        format!(
            "{}#{}({})",
            self.class_name,
            self.method.name(),
            self.method.param_types().join(",")
        )
    }
}

impl fmt::Debug for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetHandle")
            .field("id", &self.id)
            .field("signature", &self.signature())
            .finish()
    }
}

impl PartialEq for TargetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TargetHandle {}

// 类名 -> 当前加载实例
pub struct Catalog {
    classes: RwLock<BTreeMap<String, Arc<LoadedClass>>>,
    next_instance: AtomicU64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(BTreeMap::new()),
            next_instance: AtomicU64::new(1),
        }
    }

    // 加载类并返回实例 id；同名旧实例被替换，其 TargetHandle 随之失效
    pub fn load(&self, def: ClassDef) -> u64 {
        let instance_id = self.next_instance.fetch_add(1, Ordering::Relaxed);
        let name = def.name.clone();
        let loaded = Arc::new(LoadedClass { instance_id, def });
        let replaced = self.classes.write_or_poison().insert(name.clone(), loaded);
        if replaced.is_some() {
            log::debug(format_args!("class {name} reloaded as instance {instance_id}"));
        }
        instance_id
    }

    pub fn unload(&self, name: &str) -> bool {
        let removed = self.classes.write_or_poison().remove(name).is_some();
        if removed {
            log::debug(format_args!("class {name} unloaded"));
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read_or_poison().contains_key(name)
    }

    pub fn class_names(&self) -> Vec<String> {
        self.classes.read_or_poison().keys().cloned().collect()
    }

    pub(crate) fn class(&self, name: &str) -> Option<Arc<LoadedClass>> {
        self.classes.read_or_poison().get(name).cloned()
    }
}
