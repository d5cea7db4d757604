//! Container and item catalogue types.
//!
//! All lengths are integer units of a fixed subdivision (tenths of a
//! millimetre in the board-game organiser use case).

use serde::{Deserialize, Serialize};

/// The fixed box being packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Container {
    /// Length (Y extent).
    pub length: u32,
    /// Width (X extent).
    pub width: u32,
    /// Height (Z extent).
    pub height: u32,
}

impl Container {
    /// Create a validated container.
    pub fn new(length: u32, width: u32, height: u32) -> Result<Self, ConfigError> {
        let container = Self {
            length,
            width,
            height,
        };
        container.validate()?;
        Ok(container)
    }

    /// Check that every dimension is positive and the volume fits penalty
    /// bookkeeping (signed 64-bit).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.length == 0 || self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidContainer {
                length: self.length,
                width: self.width,
                height: self.height,
            });
        }
        match self.checked_volume() {
            Some(volume) if volume <= i64::MAX as u64 => Ok(()),
            _ => Err(ConfigError::ContainerTooLarge {
                length: self.length,
                width: self.width,
                height: self.height,
            }),
        }
    }

    /// Total packable volume, saturating for containers that fail validation.
    pub fn volume(&self) -> u64 {
        self.checked_volume().unwrap_or(u64::MAX)
    }

    fn checked_volume(&self) -> Option<u64> {
        (self.length as u64)
            .checked_mul(self.width as u64)?
            .checked_mul(self.height as u64)
    }

    /// Usable extents along (x, y, z), i.e. (width, length, height).
    pub fn layer_size(&self) -> (u32, u32, u32) {
        (self.width, self.length, self.height)
    }

    /// Volume split evenly into `layers` partitions.
    ///
    /// Integer division: any remainder is dropped, matching how the partitions
    /// are used purely as penalty bookkeeping.
    pub fn total_space(&self, layers: usize) -> Vec<i64> {
        let layers = layers.max(1);
        let share = (self.volume() / layers as u64).min(i64::MAX as u64) as i64;
        vec![share; layers]
    }
}

/// Axis along which copies of an item are stacked inside their tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingAxis {
    /// Copies stack along Y and the footprint keeps the item's X/Z.
    #[default]
    Vertical,
    /// Copies stack along Y and the item's X/Z are swapped.
    Horizontal,
}

/// Something that needs a tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemDescriptor {
    /// Arbitrary box already expressed in packing orientation.
    Generic {
        size_x: u32,
        size_y: u32,
        size_z: u32,
        #[serde(default)]
        stacking: StackingAxis,
    },
    /// A flat card or tile, stood on its edge.
    Card {
        length: u32,
        width: u32,
        thickness: u32,
    },
}

impl ItemDescriptor {
    /// Shorthand for a vertically stacked generic item.
    pub fn generic(size_x: u32, size_y: u32, size_z: u32) -> Self {
        Self::Generic {
            size_x,
            size_y,
            size_z,
            stacking: StackingAxis::Vertical,
        }
    }

    pub fn card(length: u32, width: u32, thickness: u32) -> Self {
        Self::Card {
            length,
            width,
            thickness,
        }
    }

    /// Bounding box of a single item in packing orientation (x, y, z).
    pub fn bounding_box(&self) -> (u32, u32, u32) {
        match *self {
            Self::Generic {
                size_x,
                size_y,
                size_z,
                ..
            } => (size_x, size_y, size_z),
            // Cards stand upright: thickness runs along the stack.
            Self::Card {
                length,
                width,
                thickness,
            } => (width, thickness, length),
        }
    }

    pub fn stacking_axis(&self) -> StackingAxis {
        match *self {
            Self::Generic { stacking, .. } => stacking,
            Self::Card { .. } => StackingAxis::Vertical,
        }
    }

    fn has_positive_size(&self) -> bool {
        let (x, y, z) = self.bounding_box();
        x > 0 && y > 0 && z > 0
    }
}

/// One descriptor together with how many copies must fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemClass {
    pub item: ItemDescriptor,
    pub count: u32,
}

impl ItemClass {
    /// Bounding box required to hold every copy of the item.
    pub fn required_box(&self) -> (u32, u32, u32) {
        let (x, y, z) = self.item.bounding_box();
        let stacked = y.saturating_mul(self.count);
        match self.item.stacking_axis() {
            StackingAxis::Vertical => (x, stacked, z),
            StackingAxis::Horizontal => (z, stacked, x),
        }
    }
}

/// Container plus the ordered list of item classes to pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalogue {
    container: Container,
    classes: Vec<ItemClass>,
}

impl Catalogue {
    /// Create an empty catalogue for a validated container.
    pub fn new(container: Container) -> Result<Self, ConfigError> {
        container.validate()?;
        Ok(Self {
            container,
            classes: Vec::new(),
        })
    }

    /// Build a catalogue from `(descriptor, count)` pairs and validate it.
    pub fn from_items<I>(container: Container, items: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (ItemDescriptor, u32)>,
    {
        let mut catalogue = Self::new(container)?;
        for (item, count) in items {
            catalogue.add_items(item, count)?;
        }
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Require `count` more copies of `item`.
    ///
    /// A descriptor that is already present keeps its position and has its
    /// count increased.
    pub fn add_items(&mut self, item: ItemDescriptor, count: u32) -> Result<(), ConfigError> {
        if count == 0 {
            return Err(ConfigError::ZeroCount(item));
        }
        if !item.has_positive_size() {
            return Err(ConfigError::InvalidItem(item));
        }
        match self.classes.iter_mut().find(|c| c.item == item) {
            Some(class) => class.count = class.count.saturating_add(count),
            None => self.classes.push(ItemClass { item, count }),
        }
        Ok(())
    }

    /// Validate the container and every class; an empty catalogue is an error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.container.validate()?;
        if self.classes.is_empty() {
            return Err(ConfigError::EmptyCatalogue);
        }
        for class in &self.classes {
            if class.count == 0 {
                return Err(ConfigError::ZeroCount(class.item));
            }
            if !class.item.has_positive_size() {
                return Err(ConfigError::InvalidItem(class.item));
            }
        }
        Ok(())
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Item classes in insertion order; solutions are index-aligned with this.
    pub fn classes(&self) -> &[ItemClass] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// See [`Container::total_space`].
    pub fn total_space(&self, layers: usize) -> Vec<i64> {
        self.container.total_space(layers)
    }

    /// See [`Container::layer_size`].
    pub fn layer_size(&self) -> (u32, u32, u32) {
        self.container.layer_size()
    }
}

/// Container and catalogue validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Container dimensions must be positive, got {length}x{width}x{height}")]
    InvalidContainer { length: u32, width: u32, height: u32 },
    #[error("Container volume {length}x{width}x{height} is too large")]
    ContainerTooLarge { length: u32, width: u32, height: u32 },
    #[error("Item count must be positive for {0:?}")]
    ZeroCount(ItemDescriptor),
    #[error("Item dimensions must be positive for {0:?}")]
    InvalidItem(ItemDescriptor),
    #[error("Catalogue contains no items")]
    EmptyCatalogue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_bounding_box_is_permuted() {
        let card = ItemDescriptor::card(88, 63, 1);
        assert_eq!(card.bounding_box(), (63, 1, 88));
        assert_eq!(card.stacking_axis(), StackingAxis::Vertical);
    }

    #[test]
    fn test_required_box_scales_stack() {
        let class = ItemClass {
            item: ItemDescriptor::card(88, 63, 1),
            count: 100,
        };
        assert_eq!(class.required_box(), (63, 100, 88));

        let sideways = ItemClass {
            item: ItemDescriptor::Generic {
                size_x: 10,
                size_y: 2,
                size_z: 30,
                stacking: StackingAxis::Horizontal,
            },
            count: 5,
        };
        assert_eq!(sideways.required_box(), (30, 10, 10));
    }

    #[test]
    fn test_total_space_split() {
        let container = Container::new(300, 300, 120).unwrap();
        assert_eq!(container.total_space(1), vec![10_800_000]);
        assert_eq!(container.total_space(3), vec![3_600_000; 3]);
        assert_eq!(container.layer_size(), (300, 300, 120));

        let narrow = Container::new(88, 300, 120).unwrap();
        assert_eq!(narrow.layer_size(), (300, 88, 120));
    }

    #[test]
    fn test_add_items_merges_counts() {
        let container = Container::new(300, 300, 120).unwrap();
        let card = ItemDescriptor::card(88, 63, 1);
        let tile = ItemDescriptor::card(100, 100, 1);
        let catalogue =
            Catalogue::from_items(container, [(card, 40), (tile, 10), (card, 60)]).unwrap();

        assert_eq!(catalogue.len(), 2);
        assert_eq!(catalogue.classes()[0].item, card);
        assert_eq!(catalogue.classes()[0].count, 100);
        assert_eq!(catalogue.classes()[1].count, 10);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(matches!(
            Container::new(0, 10, 10),
            Err(ConfigError::InvalidContainer { .. })
        ));

        let container = Container::new(10, 10, 10).unwrap();
        assert!(matches!(
            Catalogue::from_items(container, []),
            Err(ConfigError::EmptyCatalogue)
        ));
        assert!(matches!(
            Catalogue::from_items(container, [(ItemDescriptor::generic(1, 1, 1), 0)]),
            Err(ConfigError::ZeroCount(_))
        ));
        assert!(matches!(
            Catalogue::from_items(container, [(ItemDescriptor::generic(0, 1, 1), 1)]),
            Err(ConfigError::InvalidItem(_))
        ));
    }

    #[test]
    fn test_oversized_container_rejected() {
        // 3e6 cubed overflows u64; 2.1e6 cubed fits u64 but not i64.
        for side in [3_000_000, 2_100_000, u32::MAX] {
            assert!(matches!(
                Container::new(side, side, side),
                Err(ConfigError::ContainerTooLarge { .. })
            ));
        }

        let large = Container::new(2_000_000, 2_000_000, 2_000_000).unwrap();
        assert_eq!(large.volume(), 8_000_000_000_000_000_000);
        assert_eq!(large.total_space(2), vec![4_000_000_000_000_000_000; 2]);
    }
}
