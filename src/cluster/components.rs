use std::collections::HashMap;
use std::hash::Hash;

/// Connected components of an undirected edge list.
///
/// Group ids are dense (`0..len()`) and follow the order in which ids are first
/// seen in the edge list, so a fixed input ordering always yields the same
/// numbering. Ids that never appear in an edge are not part of the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Components<T: Eq + Hash> {
    group_of: HashMap<T, usize>,
    members: Vec<Vec<T>>,
}

impl<T: Clone + Eq + Hash> Components<T> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn group_of(&self, id: &T) -> Option<usize> {
        self.group_of.get(id).copied()
    }

    pub fn members(&self, group: usize) -> &[T] {
        self.members.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn as_map(&self) -> &HashMap<T, usize> {
        &self.group_of
    }

    pub fn into_map(self) -> HashMap<T, usize> {
        self.group_of
    }
}

pub fn compute_groups<T, I>(edges: I) -> Components<T>
where
    T: Clone + Eq + Hash,
    I: IntoIterator<Item = (T, T)>,
{
    let mut index_of: HashMap<T, usize> = HashMap::new();
    let mut ids: Vec<T> = Vec::new();
    let mut adjacency: Vec<Vec<usize>> = Vec::new();

    let mut intern = |id: T, ids: &mut Vec<T>, adjacency: &mut Vec<Vec<usize>>| -> usize {
        *index_of.entry(id.clone()).or_insert_with(|| {
            ids.push(id);
            adjacency.push(Vec::new());
            ids.len() - 1
        })
    };

    for (a, b) in edges {
        let a = intern(a, &mut ids, &mut adjacency);
        let b = intern(b, &mut ids, &mut adjacency);
        adjacency[a].push(b);
        if a != b {
            adjacency[b].push(a);
        }
    }

    let mut group = vec![usize::MAX; ids.len()];
    let mut members: Vec<Vec<T>> = Vec::new();
    let mut stack = Vec::new();

    for start in 0..ids.len() {
        if group[start] != usize::MAX {
            continue;
        }

        let group_id = members.len();
        let mut component = Vec::new();
        group[start] = group_id;
        stack.push(start);

        while let Some(current) = stack.pop() {
            component.push(ids[current].clone());
            for &next in &adjacency[current] {
                if group[next] == usize::MAX {
                    group[next] = group_id;
                    stack.push(next);
                }
            }
        }

        members.push(component);
    }

    let group_of = ids.into_iter().zip(group).collect();
    Components { group_of, members }
}

#[cfg(test)]
mod tests {
    use super::compute_groups;

    #[test]
    fn empty_edges_yield_no_groups() {
        let components = compute_groups(Vec::<(&str, &str)>::new());
        assert!(components.is_empty());
        assert!(components.as_map().is_empty());
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let components = compute_groups([("c", "d"), ("a", "b"), ("d", "e")]);
        assert_eq!(components.len(), 2);
        assert_eq!(components.group_of(&"c"), Some(0));
        assert_eq!(components.group_of(&"e"), Some(0));
        assert_eq!(components.group_of(&"a"), Some(1));
        assert_eq!(components.group_of(&"b"), Some(1));
        assert_eq!(components.group_of(&"z"), None);
    }

    #[test]
    fn long_chains_are_one_component() {
        let edges = (0..500).map(|index| (index, index + 1)).collect::<Vec<_>>();
        let components = compute_groups(edges);
        assert_eq!(components.len(), 1);
        assert_eq!(components.members(0).len(), 501);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let edges = [(1, 2), (3, 4), (2, 5), (6, 6)];
        let first = compute_groups(edges);
        let second = compute_groups(edges);
        assert_eq!(first, second);
        assert_eq!(first.group_of(&6), Some(2));
    }
}
