use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;

use super::EventType;
use super::HostId;

/// One running component of one service inside a cluster.
///
/// Identity is `(component_name, service_name)`. `PartialEq`/`Hash` only
/// look at the identity, so merges and removals never depend on the rest of
/// the attributes.
///
/// `host_names` and `public_host_names` are controller-internal. They are
/// cleared on every copy that is sent to agents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyComponent {
    pub component_name: String,
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub host_ids: BTreeSet<HostId>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub host_names: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub public_host_names: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub component_level_params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub command_params: BTreeMap<String, String>,
}

impl PartialEq for TopologyComponent {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.component_name == other.component_name && self.service_name == other.service_name
    }
}

impl Eq for TopologyComponent {}

impl Hash for TopologyComponent {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.component_name.hash(state);
        self.service_name.hash(state);
    }
}

impl TopologyComponent {
    pub fn new(
        component_name: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            component_name: component_name.into(),
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_version(
        mut self,
        version: impl Into<String>,
    ) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_host_ids(
        mut self,
        host_ids: impl IntoIterator<Item = HostId>,
    ) -> Self {
        self.host_ids = host_ids.into_iter().collect();
        self
    }

    pub fn with_host_names<S: Into<String>>(
        mut self,
        host_names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.host_names = host_names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_public_host_names<S: Into<String>>(
        mut self,
        public_host_names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.public_host_names = public_host_names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_component_level_params(
        mut self,
        params: BTreeMap<String, String>,
    ) -> Self {
        self.component_level_params = params;
        self
    }

    pub fn with_command_params(
        mut self,
        params: BTreeMap<String, String>,
    ) -> Self {
        self.command_params = params;
        self
    }

    /// Whether any of the three host reference sets is non-empty
    pub fn has_host_references(&self) -> bool {
        !self.host_ids.is_empty() || !self.host_names.is_empty() || !self.public_host_names.is_empty()
    }

    /// Merges `incoming` into this component.
    ///
    /// Host reference sets are unioned, a non-empty incoming version replaces
    /// the current one, and both parameter maps are overlaid with incoming
    /// keys winning. Components with a different identity are ignored.
    ///
    /// Returns whether any attribute actually changed.
    pub fn update_component(
        &mut self,
        incoming: &TopologyComponent,
    ) -> bool {
        if self != incoming {
            return false;
        }
        let mut changed = false;

        if let Some(version) = incoming.version.as_ref().filter(|v| !v.is_empty()) {
            if self.version.as_ref() != Some(version) {
                self.version = Some(version.clone());
                changed = true;
            }
        }
        if incoming.display_name.is_some() && self.display_name != incoming.display_name {
            self.display_name = incoming.display_name.clone();
            changed = true;
        }

        for id in &incoming.host_ids {
            changed |= self.host_ids.insert(*id);
        }
        for name in &incoming.host_names {
            changed |= self.host_names.insert(name.clone());
        }
        for name in &incoming.public_host_names {
            changed |= self.public_host_names.insert(name.clone());
        }

        changed |= overlay(&mut self.component_level_params, &incoming.component_level_params);
        changed |= overlay(&mut self.command_params, &incoming.command_params);
        changed
    }

    /// Removes exactly the host references named by `incoming` (set
    /// difference). The component itself stays, even when left empty.
    ///
    /// Returns whether any reference was removed.
    pub fn remove_references(
        &mut self,
        incoming: &TopologyComponent,
    ) -> bool {
        if self != incoming {
            return false;
        }
        let mut changed = false;
        for id in &incoming.host_ids {
            changed |= self.host_ids.remove(id);
        }
        for name in &incoming.host_names {
            changed |= self.host_names.remove(name);
        }
        for name in &incoming.public_host_names {
            changed |= self.public_host_names.remove(name);
        }
        changed
    }

    /// Drops the controller-internal name sets
    pub fn clear_host_names(&mut self) {
        self.host_names.clear();
        self.public_host_names.clear();
    }
}

fn overlay(
    target: &mut BTreeMap<String, String>,
    incoming: &BTreeMap<String, String>,
) -> bool {
    let mut changed = false;
    for (key, value) in incoming {
        if target.get(key) != Some(value) {
            target.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyHost {
    pub host_id: HostId,
    pub host_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rack_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
}

impl TopologyHost {
    pub fn new(
        host_id: HostId,
        host_name: impl Into<String>,
    ) -> Self {
        Self {
            host_id,
            host_name: host_name.into(),
            rack_name: None,
            ipv4: None,
        }
    }

    pub fn with_rack(
        mut self,
        rack_name: impl Into<String>,
    ) -> Self {
        self.rack_name = Some(rack_name.into());
        self
    }

    pub fn with_ipv4(
        mut self,
        ipv4: impl Into<String>,
    ) -> Self {
        self.ipv4 = Some(ipv4.into());
        self
    }
}

/// Topology of one cluster: its components and its hosts.
///
/// Component identities are unique within `components`; hosts are unique by
/// id within `hosts`. Insertion order is kept so fingerprints are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyCluster {
    #[serde(default)]
    pub components: Vec<TopologyComponent>,
    #[serde(default)]
    pub hosts: Vec<TopologyHost>,
}

impl TopologyCluster {
    pub fn new(
        components: Vec<TopologyComponent>,
        hosts: Vec<TopologyHost>,
    ) -> Self {
        Self { components, hosts }
    }

    /// A cluster with neither components nor hosts may be removed
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.hosts.is_empty()
    }

    pub fn component(
        &self,
        service_name: &str,
        component_name: &str,
    ) -> Option<&TopologyComponent> {
        self.components
            .iter()
            .find(|c| c.service_name == service_name && c.component_name == component_name)
    }

    pub fn host(
        &self,
        host_id: HostId,
    ) -> Option<&TopologyHost> {
        self.hosts.iter().find(|h| h.host_id == host_id)
    }

    /// Applies a delta of components and hosts to this cluster.
    ///
    /// CREATE and UPDATE merge matching components and append unknown ones;
    /// hosts are replaced or appended by id.
    ///
    /// DELETE removes the host references a delta component names. A delta
    /// component naming no references at all removes the existing entry,
    /// but only once that entry has no references left. Hosts named by the
    /// delta are removed by id.
    ///
    /// Returns whether anything actually changed.
    pub fn update(
        &mut self,
        components: &[TopologyComponent],
        hosts: &[TopologyHost],
        event_type: EventType,
    ) -> bool {
        match event_type {
            EventType::Create | EventType::Update => self.merge(components, hosts),
            EventType::Delete => self.remove(components, hosts),
        }
    }

    fn merge(
        &mut self,
        components: &[TopologyComponent],
        hosts: &[TopologyHost],
    ) -> bool {
        let mut changed = false;
        for incoming in components {
            match self.components.iter_mut().find(|c| *c == incoming) {
                Some(existing) => changed |= existing.update_component(incoming),
                None => {
                    self.components.push(incoming.clone());
                    changed = true;
                }
            }
        }
        for incoming in hosts {
            match self.hosts.iter_mut().find(|h| h.host_id == incoming.host_id) {
                Some(existing) => {
                    if existing != incoming {
                        *existing = incoming.clone();
                        changed = true;
                    }
                }
                None => {
                    self.hosts.push(incoming.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    fn remove(
        &mut self,
        components: &[TopologyComponent],
        hosts: &[TopologyHost],
    ) -> bool {
        let mut changed = false;
        for incoming in components {
            let Some(position) = self.components.iter().position(|c| c == incoming) else {
                continue;
            };
            if incoming.has_host_references() {
                changed |= self.components[position].remove_references(incoming);
            } else if !self.components[position].has_host_references() {
                self.components.remove(position);
                changed = true;
            }
        }
        for incoming in hosts {
            let before = self.hosts.len();
            self.hosts.retain(|h| h.host_id != incoming.host_id);
            changed |= self.hosts.len() != before;
        }
        changed
    }

    /// Copy of this cluster that is safe to send to agents
    pub fn agent_copy(&self) -> Self {
        let mut copy = self.clone();
        for component in &mut copy.components {
            component.clear_host_names();
        }
        copy
    }
}
