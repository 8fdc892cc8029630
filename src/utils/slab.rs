use std::fmt;

/// Stable address of a value stored in a [`Slab`].
///
/// A key pairs the slot index with the generation the slot had when the value was
/// inserted. Removing the value bumps the generation, so an old key never resolves
/// to whatever is stored in the slot afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    index: usize,
    generation: u32,
}

impl Key {
    /// Position of the slot inside the slab.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Generation of the slot when this key was handed out.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

impl<T> Entry<T> {
    fn vacant() -> Self {
        Self {
            generation: 0,
            value: None,
        }
    }
}

pub(crate) struct Slab<T> {
    items: Vec<Entry<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Slab<T> {
    pub(crate) fn new(size: usize) -> Self {
        let items = (0..size).map(|_| Entry::vacant()).collect();
        // Popped from the back, so the lowest index is handed out first.
        let free = (0..size).rev().collect();

        Self {
            items,
            free,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn insert(&mut self, item: T) -> Key {
        let index = if let Some(i) = self.free.pop() {
            i
        } else {
            let len = self.items.len();
            let new_len = if len == 0 { 1 } else { 2 * len };

            self.items.extend((len..new_len).map(|_| Entry::vacant()));
            self.free.extend(((len + 1)..new_len).rev());

            len
        };

        let entry = &mut self.items[index];
        entry.value = Some(item);
        self.len += 1;

        Key {
            index,
            generation: entry.generation,
        }
    }

    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let entry = self.items.get_mut(key.index)?;
        if entry.generation != key.generation {
            return None;
        }

        let item = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(key.index);
        self.len -= 1;

        Some(item)
    }

    pub(crate) fn get(&self, key: Key) -> Option<&T> {
        self.items
            .get(key.index)
            .filter(|entry| entry.generation == key.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        self.items
            .get_mut(key.index)
            .filter(|entry| entry.generation == key.generation)
            .and_then(|entry| entry.value.as_mut())
    }

    /// Keys of every occupied slot, in index order.
    pub(crate) fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.items.iter().enumerate().filter_map(|(index, entry)| {
            entry.value.as_ref().map(|_| Key {
                index,
                generation: entry.generation,
            })
        })
    }
}
