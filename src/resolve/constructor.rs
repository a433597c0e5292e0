// 构造函数查找：仅本类声明的构造函数，不沿继承链
use super::matcher::{ParamShape, ParamShapeMatcher};
use crate::catalog::{Catalog, LoadedClass, MethodDef, TargetHandle};
use crate::errno::Errno;
use crate::log;
use std::ops::RangeInclusive;
use std::sync::Arc;

type ConstructorFilter<'a> = Box<dyn Fn(&MethodDef) -> bool + 'a>;

pub struct ConstructorFinder<'a> {
    class: Arc<LoadedClass>,
    filters: Vec<ConstructorFilter<'a>>,
    conditions: Vec<String>,
}

impl<'a> ConstructorFinder<'a> {
    pub fn from_class(catalog: &Catalog, class_name: &str) -> Result<Self, Errno> {
        let Some(class) = catalog.class(class_name) else {
            log::debug(format_args!("class {class_name} not loaded"));
            return Err(Errno::NotFound);
        };
        Ok(Self {
            class,
            filters: Vec::new(),
            conditions: Vec::new(),
        })
    }

    fn push_filter<F>(mut self, condition: String, filter: F) -> Self
    where
        F: Fn(&MethodDef) -> bool + 'a,
    {
        self.conditions.push(condition);
        self.filters.push(Box::new(filter));
        self
    }

    pub fn filter_params<M>(self, matcher: M) -> Self
    where
        M: ParamShapeMatcher + 'a,
    {
        let condition = ParamShapeMatcher::describe(&matcher);
        self.push_filter(condition, move |ctor| {
            ParamShapeMatcher::matches(&matcher, ctor.param_types())
        })
    }

    pub fn filter_param_count(self, range: RangeInclusive<usize>) -> Self {
        self.filter_params(ParamShape::any().count(range))
    }

    // 按位置给出类型子串，同时限定参数个数
    pub fn filter_param_types(self, types: &[&str]) -> Self {
        let shape: Vec<Option<&str>> = types.iter().copied().map(Some).collect();
        self.filter_params(ParamShape::types(&shape))
    }

    pub fn filter_include_modifiers(self, modifiers: u32) -> Self {
        self.push_filter(format!("modifiers include 0x{modifiers:x}"), move |ctor| {
            ctor.modifier_bits() & modifiers == modifiers
        })
    }

    pub fn filter_exclude_modifiers(self, modifiers: u32) -> Self {
        self.push_filter(format!("modifiers exclude 0x{modifiers:x}"), move |ctor| {
            ctor.modifier_bits() & modifiers == 0
        })
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&MethodDef) -> bool + 'a,
    {
        self.push_filter("custom".to_string(), predicate)
    }

    // 声明顺序
    pub fn all(&self) -> Vec<TargetHandle> {
        (0..self.class.def.constructors().len())
            .filter_map(|index| TargetHandle::constructor(&self.class, index))
            .filter(|target| self.filters.iter().all(|filter| filter(target.method())))
            .collect()
    }

    pub fn first(&self) -> Result<TargetHandle, Errno> {
        match self.all().into_iter().next() {
            Some(target) => Ok(target),
            None => Err(self.not_found()),
        }
    }

    pub fn single(&self) -> Result<TargetHandle, Errno> {
        let mut matches = self.all();
        match matches.len() {
            0 => Err(self.not_found()),
            1 => Ok(matches.remove(0)),
            count => {
                log::debug(format_args!(
                    "{count} constructors matched in {}, conditions: {}",
                    self.class.def.name(),
                    self.describe_conditions()
                ));
                Err(Errno::AmbiguousMatch)
            }
        }
    }

    fn not_found(&self) -> Errno {
        log::debug(format_args!(
            "no constructor matched in {}, conditions: {}",
            self.class.def.name(),
            self.describe_conditions()
        ));
        Errno::NotFound
    }

    fn describe_conditions(&self) -> String {
        if self.conditions.is_empty() {
            return "none".to_string();
        }
        self.conditions.join(", ")
    }
}
