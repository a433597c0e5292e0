// 目标解析：在方法目录上按名称、参数形态与继承链查找方法
// 候选顺序：本类声明方法 -> 本类接口 -> 逐级父类（各自声明方法 -> 接口）
// first() 的决胜规则为该顺序中的第一个
use crate::catalog::{Catalog, LoadedClass, MODIFIER_STATIC, MethodDef, TargetHandle};
use crate::errno::Errno;
use crate::log;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::sync::Arc;

mod constructor;
mod matcher;

pub use constructor::ConstructorFinder;
pub use matcher::{NameMatcher, NamePattern, ParamShape, ParamShapeMatcher};

type MethodFilter<'a> = Box<dyn Fn(&MethodDef) -> bool + 'a>;
type SuperStop<'a> = Box<dyn Fn(&str) -> bool + 'a>;

pub struct MethodFinder<'a> {
    catalog: &'a Catalog,
    class: Arc<LoadedClass>,
    super_stop: Option<SuperStop<'a>>,
    filters: Vec<MethodFilter<'a>>,
    conditions: Vec<String>,
}

impl<'a> MethodFinder<'a> {
    pub fn from_class(catalog: &'a Catalog, class_name: &str) -> Result<Self, Errno> {
        let Some(class) = catalog.class(class_name) else {
            log::debug(format_args!("class {class_name} not loaded"));
            return Err(Errno::NotFound);
        };
        Ok(Self {
            catalog,
            class,
            super_stop: None,
            filters: Vec::new(),
            conditions: Vec::new(),
        })
    }

    // 遍历全部父类直到根
    pub fn find_super(self) -> Self {
        self.find_super_until(|_| false)
    }

    // 在第一个使 until 为真的父类之前停止
    pub fn find_super_until<F>(mut self, until: F) -> Self
    where
        F: Fn(&str) -> bool + 'a,
    {
        self.super_stop = Some(Box::new(until));
        self
    }

    fn push_filter<F>(mut self, condition: String, filter: F) -> Self
    where
        F: Fn(&MethodDef) -> bool + 'a,
    {
        self.conditions.push(condition);
        self.filters.push(Box::new(filter));
        self
    }

    pub fn filter_name<M>(self, matcher: M) -> Self
    where
        M: NameMatcher + 'a,
    {
        let condition = format!("name {}", NameMatcher::describe(&matcher));
        self.push_filter(condition, move |method| {
            NameMatcher::matches(&matcher, method.name())
        })
    }

    pub fn filter_by_name(self, name: &str) -> Self {
        self.filter_name(NamePattern::exact(name))
    }

    pub fn filter_params<M>(self, matcher: M) -> Self
    where
        M: ParamShapeMatcher + 'a,
    {
        let condition = ParamShapeMatcher::describe(&matcher);
        self.push_filter(condition, move |method| {
            ParamShapeMatcher::matches(&matcher, method.param_types())
        })
    }

    pub fn filter_param_count(self, range: RangeInclusive<usize>) -> Self {
        self.filter_params(ParamShape::any().count(range))
    }

    pub fn filter_include_modifiers(self, modifiers: u32) -> Self {
        self.push_filter(format!("modifiers include 0x{modifiers:x}"), move |method| {
            method.modifier_bits() & modifiers == modifiers
        })
    }

    pub fn filter_exclude_modifiers(self, modifiers: u32) -> Self {
        self.push_filter(format!("modifiers exclude 0x{modifiers:x}"), move |method| {
            method.modifier_bits() & modifiers == 0
        })
    }

    pub fn filter_static(self) -> Self {
        self.filter_include_modifiers(MODIFIER_STATIC)
    }

    pub fn filter_non_static(self) -> Self {
        self.filter_exclude_modifiers(MODIFIER_STATIC)
    }

    pub fn filter_return_type(self, return_type: &str) -> Self {
        let expected = return_type.to_string();
        self.push_filter(format!("returns {return_type}"), move |method| {
            method.return_type() == expected
        })
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&MethodDef) -> bool + 'a,
    {
        self.push_filter("custom".to_string(), predicate)
    }

    // 全部匹配，按候选顺序
    pub fn all(&self) -> Vec<TargetHandle> {
        self.candidates()
            .into_iter()
            .filter(|target| self.filters.iter().all(|filter| filter(target.method())))
            .collect()
    }

    pub fn first(&self) -> Result<TargetHandle, Errno> {
        match self.all().into_iter().next() {
            Some(target) => Ok(target),
            None => Err(self.not_found()),
        }
    }

    // 恰好一个匹配，否则 NotFound / AmbiguousMatch
    pub fn single(&self) -> Result<TargetHandle, Errno> {
        let mut matches = self.all();
        match matches.len() {
            0 => Err(self.not_found()),
            1 => Ok(matches.remove(0)),
            count => {
                let found: Vec<String> = matches.iter().map(TargetHandle::signature).collect();
                log::debug(format_args!(
                    "{count} methods matched in {}: [{}], conditions: {}",
                    self.class.def.name(),
                    found.join("; "),
                    self.describe_conditions()
                ));
                Err(Errno::AmbiguousMatch)
            }
        }
    }

    fn not_found(&self) -> Errno {
        log::debug(format_args!(
            "no method matched in {}, conditions: {}",
            self.class.def.name(),
            self.describe_conditions()
        ));
        Errno::NotFound
    }

    fn describe_conditions(&self) -> String {
        let mut conditions = self.conditions.clone();
        if self.super_stop.is_some() {
            conditions.push("search super".to_string());
        }
        if conditions.is_empty() {
            return "none".to_string();
        }
        conditions.join(", ")
    }

    fn candidates(&self) -> Vec<TargetHandle> {
        let mut visited = BTreeSet::new();
        let mut out = Vec::new();
        self.collect_class(&self.class, &mut visited, &mut out);

        let Some(stop) = &self.super_stop else {
            return out;
        };
        let mut next = self.class.def.superclass().map(str::to_string);
        while let Some(name) = next {
            if stop(name.as_str()) {
                break;
            }
            let Some(class) = self.catalog.class(&name) else {
                log::debug(format_args!("superclass {name} not loaded, stop"));
                break;
            };
            // 继承环
            if !self.collect_class(&class, &mut visited, &mut out) {
                break;
            }
            next = class.def.superclass().map(str::to_string);
        }
        out
    }

    // 已访问过的类返回 false
    fn collect_class(
        &self,
        class: &Arc<LoadedClass>,
        visited: &mut BTreeSet<u64>,
        out: &mut Vec<TargetHandle>,
    ) -> bool {
        if !visited.insert(class.instance_id) {
            return false;
        }
        let methods = class.def.methods().len();
        out.extend((0..methods).filter_map(|index| TargetHandle::new(class, index)));
        for interface in class.def.interfaces() {
            if let Some(interface) = self.catalog.class(interface) {
                self.collect_class(&interface, visited, out);
            }
        }
        true
    }
}

/// 严格解析：沿完整父类链查找，要求恰好一个匹配。
pub fn resolve<'a, N, P>(
    catalog: &'a Catalog,
    class_name: &str,
    name: N,
    params: P,
) -> Result<TargetHandle, Errno>
where
    N: NameMatcher + 'a,
    P: ParamShapeMatcher + 'a,
{
    MethodFinder::from_class(catalog, class_name)?
        .find_super()
        .filter_name(name)
        .filter_params(params)
        .single()
}
