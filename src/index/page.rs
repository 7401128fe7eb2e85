// Derived from
//   https://github.com/servo/html5ever/blob/master/html5ever/examples/noop-tree-builder.rs
// Which has the following copyright header:
//
// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::links::Link;
use crate::prelude::*;

use std::borrow::Borrow;
use std::borrow::Cow;
use std::collections::HashMap;
use std::default::Default;

use html5ever::tendril::*;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{expanded_name, local_name, namespace_url, ns, parse_document};
use html5ever::{Attribute, ExpandedName, LocalNameStaticSet, QualName};
use string_cache::Atom;

const BASE_TAG: ExpandedName = expanded_name!(html "base");
const A_TAG: ExpandedName = expanded_name!(html "a");
const HREF_ATTR: Atom<LocalNameStaticSet> = html5ever::local_name!("href");
static REQUIRES_PYTHON_ATTR: Lazy<Atom<LocalNameStaticSet>> =
    Lazy::new(|| Atom::from("data-requires-python"));

/// Tree sink that ignores the tree and keeps the anchors.
struct Sink<'a> {
    next_id: usize,
    names: HashMap<usize, QualName>,
    base: Cow<'a, Url>,
    changed_base: bool,
    links: Vec<Link>,
    error: Option<anyhow::Error>,
}

impl<'a> Sink<'a> {
    fn get_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 2;
        id
    }

    fn handle_anchor(&mut self, attrs: &[Attribute]) {
        let href = match get_attr(&HREF_ATTR, attrs) {
            Some(href) => href,
            None => return,
        };
        let url = match self.base.join(href) {
            Ok(url) => url,
            Err(err) => {
                warn!("skipping unresolvable href {:?}: {}", href, err);
                return;
            }
        };
        let requires_python = match get_attr(REQUIRES_PYTHON_ATTR.borrow(), attrs) {
            None => Specifiers::any(),
            Some(text) => match Specifiers::try_from(text) {
                Ok(specifiers) => specifiers,
                Err(err) => {
                    // A constraint we can't read could silently admit
                    // incompatible artifacts, so the whole page is suspect.
                    if self.error.is_none() {
                        self.error = Some(err.context(format!(
                            "bad data-requires-python on link {:?}",
                            href
                        )));
                    }
                    return;
                }
            },
        };
        match Link::from_url(url, requires_python) {
            Ok(Some(link)) => self.links.push(link),
            // Not an artifact we care about.
            Ok(None) => {}
            Err(err) => warn!("skipping malformed filename {:?}: {}", href, err),
        }
    }
}

fn get_attr<'a>(name: &Atom<LocalNameStaticSet>, attrs: &'a [Attribute]) -> Option<&'a str> {
    for attr in attrs {
        if attr.name.local == *name {
            return Some(attr.value.as_ref());
        }
    }
    None
}

impl<'a> TreeSink for Sink<'a> {
    type Handle = usize;
    type Output = Self;

    // This is where the actual work happens

    fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<Attribute>,
        _: ElementFlags,
    ) -> usize {
        if name.expanded() == BASE_TAG {
            // HTML spec says that only the first <base> is respected
            if !self.changed_base {
                self.changed_base = true;
                if let Some(new_base_str) = get_attr(&HREF_ATTR, &attrs) {
                    if let Ok(new_base) = self.base.join(new_base_str) {
                        self.base = Cow::Owned(new_base);
                    }
                }
            }
        }

        if name.expanded() == A_TAG {
            self.handle_anchor(&attrs);
        }

        let id = self.get_id();
        self.names.insert(id, name);
        id
    }

    // Everything else is just boilerplate to make html5ever happy

    fn finish(self) -> Self {
        self
    }

    fn get_document(&mut self) -> usize {
        0
    }

    fn get_template_contents(&mut self, target: &usize) -> usize {
        target + 1
    }

    fn same_node(&self, x: &usize, y: &usize) -> bool {
        x == y
    }

    fn elem_name(&self, target: &usize) -> ExpandedName {
        self.names.get(target).expect("not an element").expanded()
    }

    fn create_comment(&mut self, _text: StrTendril) -> usize {
        self.get_id()
    }

    fn create_pi(&mut self, _target: StrTendril, _value: StrTendril) -> usize {
        // HTML doesn't have processing instructions
        unreachable!()
    }

    fn append_before_sibling(&mut self, _sibling: &usize, _new_node: NodeOrText<usize>) {}

    fn append_based_on_parent_node(
        &mut self,
        _element: &usize,
        _prev_element: &usize,
        _new_node: NodeOrText<usize>,
    ) {
    }

    fn parse_error(&mut self, _msg: Cow<'static, str>) {}
    fn set_quirks_mode(&mut self, _mode: QuirksMode) {}
    fn append(&mut self, _parent: &usize, _child: NodeOrText<usize>) {}

    fn append_doctype_to_document(&mut self, _: StrTendril, _: StrTendril, _: StrTendril) {}
    // This is only called on <html> and <body> tags, so we don't need to worry about it
    fn add_attrs_if_missing(&mut self, _target: &usize, _attrs: Vec<Attribute>) {}
    fn remove_from_parent(&mut self, _target: &usize) {}
    fn reparent_children(&mut self, _node: &usize, _new_parent: &usize) {}
    fn mark_script_already_started(&mut self, _node: &usize) {}
}

/// Scrape a simple API project page into its artifact links.
///
/// Relative hrefs resolve against `base_url` (or the page's first
/// `<base href>`, if any). Output order matches document order, and no
/// deduplication happens here. Anchors that aren't artifacts we want are
/// dropped; a `data-requires-python` we can't parse fails the whole page.
pub fn parse_index_page(base_url: &Url, body: &[u8]) -> Result<Vec<Link>> {
    let body = String::from_utf8_lossy(body);
    let sink = Sink {
        next_id: 1,
        names: HashMap::new(),
        base: Cow::Borrowed(base_url),
        changed_base: false,
        links: Vec::new(),
        error: None,
    };
    let sink = parse_document(sink, Default::default()).one(&*body);
    match sink.error {
        Some(err) => Err(err),
        None => Ok(sink.links),
    }
}
