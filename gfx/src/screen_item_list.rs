use crate::screen_item::ScreenItem;

/// The screen items of a plane.
///
/// Slots are never shifted while a frame is being drawn: removing an item leaves
/// an empty slot behind, which [`pack`](Self::pack) reclaims later. Sorting
/// remembers the permutation it applied so [`unsort`](Self::unsort) can put every
/// item back where it was.
#[derive(Debug, Clone, Default)]
pub struct ScreenItemList {
    items: Vec<Option<ScreenItem>>,
    unsorted: Vec<usize>,
}

impl ScreenItemList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, empty ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends `item` and returns its slot.
    pub fn add(&mut self, item: ScreenItem) -> usize {
        let index = self.items.len();
        self.items.push(Some(item));
        self.unsorted.push(index);
        index
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScreenItem> {
        self.items.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ScreenItem> {
        self.items.get_mut(index)?.as_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScreenItem> {
        self.items.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ScreenItem> {
        self.items.iter_mut().flatten()
    }

    /// Slot of the item created with `creation_id`.
    #[must_use]
    pub fn find(&self, creation_id: u32) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.as_ref().is_some_and(|item| item.creation_id == creation_id))
    }

    /// Takes the item out of slot `index`, leaving the slot empty.
    pub fn remove(&mut self, index: usize) -> Option<ScreenItem> {
        self.items.get_mut(index)?.take()
    }

    /// Drops empty slots. Must not be called between [`sort`](Self::sort) and
    /// [`unsort`](Self::unsort).
    pub fn pack(&mut self) {
        self.items.retain(Option::is_some);
        self.unsorted = (0..self.items.len()).collect();
    }

    /// Bubble sorts the items into drawing order, empty slots last. Equal items
    /// keep their relative order.
    pub fn sort(&mut self) {
        self.unsorted = (0..self.items.len()).collect();
        if self.items.len() < 2 {
            return;
        }

        for end in (1..self.items.len()).rev() {
            let mut swapped = false;
            for j in 0..end {
                let out_of_order = match (&self.items[j], &self.items[j + 1]) {
                    (None, Some(_)) => true,
                    (Some(a), Some(b)) => b.compare(a).is_lt(),
                    _ => false,
                };
                if out_of_order {
                    self.items.swap(j, j + 1);
                    self.unsorted.swap(j, j + 1);
                    swapped = true;
                }
            }
            if !swapped {
                break;
            }
        }
    }

    /// Restores the order from before the last [`sort`](Self::sort).
    pub fn unsort(&mut self) {
        for i in 0..self.items.len() {
            while self.unsorted[i] != i {
                let j = self.unsorted[i];
                self.items.swap(i, j);
                self.unsorted.swap(i, j);
            }
        }
    }
}
