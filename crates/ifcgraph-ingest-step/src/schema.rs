//! Built-in IFC schema table
//!
//! Covers the spatial structure, common building elements, the relationship
//! entities that carry inverse links, and the resource entities every
//! exported file contains. Explicit attributes follow IFC4 order; IFC2X3
//! files share the layout for everything listed here except a few trailing
//! attributes, which simply surface under positional names.

use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InverseDef {
    pub name: &'static str,
    /// Entity type holding the forward link.
    pub relating_type: &'static str,
    /// Forward attribute on `relating_type` that points at the owner.
    pub relating_attribute: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct EntityDef {
    pub name: &'static str,
    pub supertype: Option<&'static str>,
    /// Explicit attributes declared on this type only.
    pub attributes: &'static [&'static str],
    pub inverses: &'static [InverseDef],
}

const fn inv(
    name: &'static str,
    relating_type: &'static str,
    relating_attribute: &'static str,
) -> InverseDef {
    InverseDef {
        name,
        relating_type,
        relating_attribute,
    }
}

const fn def(
    name: &'static str,
    supertype: Option<&'static str>,
    attributes: &'static [&'static str],
    inverses: &'static [InverseDef],
) -> EntityDef {
    EntityDef {
        name,
        supertype,
        attributes,
        inverses,
    }
}

const NONE: &[InverseDef] = &[];

static DEFINITIONS: &[EntityDef] = &[
    // ------------------------------------------------------------------ kernel
    def("IfcRoot", None, &["GlobalId", "OwnerHistory", "Name", "Description"], NONE),
    def(
        "IfcObjectDefinition",
        Some("IfcRoot"),
        &[],
        &[
            inv("HasAssignments", "IfcRelAssigns", "RelatedObjects"),
            inv("Nests", "IfcRelNests", "RelatedObjects"),
            inv("IsNestedBy", "IfcRelNests", "RelatingObject"),
            inv("HasContext", "IfcRelDeclares", "RelatedDefinitions"),
            inv("IsDecomposedBy", "IfcRelAggregates", "RelatingObject"),
            inv("Decomposes", "IfcRelAggregates", "RelatedObjects"),
            inv("HasAssociations", "IfcRelAssociates", "RelatedObjects"),
        ],
    ),
    def(
        "IfcContext",
        Some("IfcObjectDefinition"),
        &["ObjectType", "LongName", "Phase", "RepresentationContexts", "UnitsInContext"],
        &[
            inv("IsDefinedBy", "IfcRelDefinesByProperties", "RelatedObjects"),
            inv("Declares", "IfcRelDeclares", "RelatingContext"),
        ],
    ),
    def("IfcProject", Some("IfcContext"), &[], NONE),
    def(
        "IfcObject",
        Some("IfcObjectDefinition"),
        &["ObjectType"],
        &[
            inv("IsTypedBy", "IfcRelDefinesByType", "RelatedObjects"),
            inv("IsDefinedBy", "IfcRelDefinesByProperties", "RelatedObjects"),
        ],
    ),
    def(
        "IfcProduct",
        Some("IfcObject"),
        &["ObjectPlacement", "Representation"],
        &[inv("ReferencedBy", "IfcRelAssignsToProduct", "RelatingProduct")],
    ),
    def(
        "IfcSpatialElement",
        Some("IfcProduct"),
        &["LongName"],
        &[
            inv("ContainsElements", "IfcRelContainedInSpatialStructure", "RelatingStructure"),
            inv("ReferencesElements", "IfcRelReferencedInSpatialStructure", "RelatingStructure"),
        ],
    ),
    def("IfcSpatialStructureElement", Some("IfcSpatialElement"), &["CompositionType"], NONE),
    def(
        "IfcSite",
        Some("IfcSpatialStructureElement"),
        &["RefLatitude", "RefLongitude", "RefElevation", "LandTitleNumber", "SiteAddress"],
        NONE,
    ),
    def(
        "IfcBuilding",
        Some("IfcSpatialStructureElement"),
        &["ElevationOfRefHeight", "ElevationOfTerrain", "BuildingAddress"],
        NONE,
    ),
    def("IfcBuildingStorey", Some("IfcSpatialStructureElement"), &["Elevation"], NONE),
    def(
        "IfcSpace",
        Some("IfcSpatialStructureElement"),
        &["PredefinedType", "ElevationWithFlooring"],
        NONE,
    ),
    // ---------------------------------------------------------------- elements
    def(
        "IfcElement",
        Some("IfcProduct"),
        &["Tag"],
        &[
            inv("ContainedInStructure", "IfcRelContainedInSpatialStructure", "RelatedElements"),
            inv("FillsVoids", "IfcRelFillsElement", "RelatedBuildingElement"),
            inv("HasOpenings", "IfcRelVoidsElement", "RelatingBuildingElement"),
            inv("ConnectedTo", "IfcRelConnectsElements", "RelatingElement"),
            inv("ConnectedFrom", "IfcRelConnectsElements", "RelatedElement"),
        ],
    ),
    def("IfcBuildingElement", Some("IfcElement"), &[], NONE),
    def("IfcWall", Some("IfcBuildingElement"), &["PredefinedType"], NONE),
    def("IfcWallStandardCase", Some("IfcWall"), &[], NONE),
    def("IfcSlab", Some("IfcBuildingElement"), &["PredefinedType"], NONE),
    def("IfcBeam", Some("IfcBuildingElement"), &["PredefinedType"], NONE),
    def("IfcColumn", Some("IfcBuildingElement"), &["PredefinedType"], NONE),
    def("IfcRoof", Some("IfcBuildingElement"), &["PredefinedType"], NONE),
    def("IfcStair", Some("IfcBuildingElement"), &["PredefinedType"], NONE),
    def(
        "IfcDoor",
        Some("IfcBuildingElement"),
        &[
            "OverallHeight",
            "OverallWidth",
            "PredefinedType",
            "OperationType",
            "UserDefinedOperationType",
        ],
        NONE,
    ),
    def(
        "IfcWindow",
        Some("IfcBuildingElement"),
        &[
            "OverallHeight",
            "OverallWidth",
            "PredefinedType",
            "PartitioningType",
            "UserDefinedPartitioningType",
        ],
        NONE,
    ),
    def("IfcBuildingElementProxy", Some("IfcBuildingElement"), &["PredefinedType"], NONE),
    def("IfcFeatureElement", Some("IfcElement"), &[], NONE),
    def("IfcFeatureElementSubtraction", Some("IfcFeatureElement"), &[], NONE),
    def(
        "IfcOpeningElement",
        Some("IfcFeatureElementSubtraction"),
        &["PredefinedType"],
        &[
            inv("VoidsElements", "IfcRelVoidsElement", "RelatedOpeningElement"),
            inv("HasFillings", "IfcRelFillsElement", "RelatingOpeningElement"),
        ],
    ),
    // ------------------------------------------------------------------- types
    def(
        "IfcTypeObject",
        Some("IfcObjectDefinition"),
        &["ApplicableOccurrence", "HasPropertySets"],
        &[inv("Types", "IfcRelDefinesByType", "RelatingType")],
    ),
    def("IfcTypeProduct", Some("IfcTypeObject"), &["RepresentationMaps", "Tag"], NONE),
    def("IfcElementType", Some("IfcTypeProduct"), &["ElementType"], NONE),
    def("IfcBuildingElementType", Some("IfcElementType"), &[], NONE),
    def("IfcWallType", Some("IfcBuildingElementType"), &["PredefinedType"], NONE),
    def("IfcSlabType", Some("IfcBuildingElementType"), &["PredefinedType"], NONE),
    // -------------------------------------------------------------- properties
    def(
        "IfcPropertyDefinition",
        Some("IfcRoot"),
        &[],
        &[
            inv("HasContext", "IfcRelDeclares", "RelatedDefinitions"),
            inv("HasAssociations", "IfcRelAssociates", "RelatedObjects"),
        ],
    ),
    def(
        "IfcPropertySetDefinition",
        Some("IfcPropertyDefinition"),
        &[],
        &[inv("DefinesOccurrence", "IfcRelDefinesByProperties", "RelatingPropertyDefinition")],
    ),
    def("IfcPropertySet", Some("IfcPropertySetDefinition"), &["HasProperties"], NONE),
    def(
        "IfcElementQuantity",
        Some("IfcPropertySetDefinition"),
        &["MethodOfMeasurement", "Quantities"],
        NONE,
    ),
    def(
        "IfcProperty",
        None,
        &["Name", "Description"],
        &[inv("PartOfPset", "IfcPropertySet", "HasProperties")],
    ),
    def("IfcSimpleProperty", Some("IfcProperty"), &[], NONE),
    def(
        "IfcPropertySingleValue",
        Some("IfcSimpleProperty"),
        &["NominalValue", "Unit"],
        NONE,
    ),
    def(
        "IfcQuantityLength",
        None,
        &["Name", "Description", "Unit", "LengthValue", "Formula"],
        NONE,
    ),
    // ----------------------------------------------------------- relationships
    def("IfcRelationship", Some("IfcRoot"), &[], NONE),
    def("IfcRelDecomposes", Some("IfcRelationship"), &[], NONE),
    def(
        "IfcRelAggregates",
        Some("IfcRelDecomposes"),
        &["RelatingObject", "RelatedObjects"],
        NONE,
    ),
    def("IfcRelNests", Some("IfcRelDecomposes"), &["RelatingObject", "RelatedObjects"], NONE),
    def(
        "IfcRelVoidsElement",
        Some("IfcRelDecomposes"),
        &["RelatingBuildingElement", "RelatedOpeningElement"],
        NONE,
    ),
    def("IfcRelConnects", Some("IfcRelationship"), &[], NONE),
    def(
        "IfcRelContainedInSpatialStructure",
        Some("IfcRelConnects"),
        &["RelatedElements", "RelatingStructure"],
        NONE,
    ),
    def(
        "IfcRelReferencedInSpatialStructure",
        Some("IfcRelConnects"),
        &["RelatedElements", "RelatingStructure"],
        NONE,
    ),
    def(
        "IfcRelFillsElement",
        Some("IfcRelConnects"),
        &["RelatingOpeningElement", "RelatedBuildingElement"],
        NONE,
    ),
    def(
        "IfcRelConnectsElements",
        Some("IfcRelConnects"),
        &["ConnectionGeometry", "RelatingElement", "RelatedElement"],
        NONE,
    ),
    def("IfcRelDefines", Some("IfcRelationship"), &[], NONE),
    def(
        "IfcRelDefinesByProperties",
        Some("IfcRelDefines"),
        &["RelatedObjects", "RelatingPropertyDefinition"],
        NONE,
    ),
    def(
        "IfcRelDefinesByType",
        Some("IfcRelDefines"),
        &["RelatedObjects", "RelatingType"],
        NONE,
    ),
    def("IfcRelAssociates", Some("IfcRelationship"), &["RelatedObjects"], NONE),
    def("IfcRelAssociatesMaterial", Some("IfcRelAssociates"), &["RelatingMaterial"], NONE),
    def(
        "IfcRelDeclares",
        Some("IfcRelationship"),
        &["RelatingContext", "RelatedDefinitions"],
        NONE,
    ),
    def(
        "IfcRelAssigns",
        Some("IfcRelationship"),
        &["RelatedObjects", "RelatedObjectsType"],
        NONE,
    ),
    def("IfcRelAssignsToProduct", Some("IfcRelAssigns"), &["RelatingProduct"], NONE),
    // --------------------------------------------------------------- resources
    def(
        "IfcOwnerHistory",
        None,
        &[
            "OwningUser",
            "OwningApplication",
            "State",
            "ChangeAction",
            "LastModifiedDate",
            "LastModifyingUser",
            "LastModifyingApplication",
            "CreationDate",
        ],
        NONE,
    ),
    def(
        "IfcPerson",
        None,
        &[
            "Identification",
            "FamilyName",
            "GivenName",
            "MiddleNames",
            "PrefixTitles",
            "SuffixTitles",
            "Roles",
            "Addresses",
        ],
        NONE,
    ),
    def(
        "IfcOrganization",
        None,
        &["Identification", "Name", "Description", "Roles", "Addresses"],
        NONE,
    ),
    def(
        "IfcPersonAndOrganization",
        None,
        &["ThePerson", "TheOrganization", "Roles"],
        NONE,
    ),
    def(
        "IfcApplication",
        None,
        &["ApplicationDeveloper", "Version", "ApplicationFullName", "ApplicationIdentifier"],
        NONE,
    ),
    def("IfcCartesianPoint", None, &["Coordinates"], NONE),
    def("IfcDirection", None, &["DirectionRatios"], NONE),
    def("IfcPolyline", None, &["Points"], NONE),
    def("IfcAxis2Placement2D", None, &["Location", "RefDirection"], NONE),
    def("IfcAxis2Placement3D", None, &["Location", "Axis", "RefDirection"], NONE),
    def(
        "IfcLocalPlacement",
        None,
        &["PlacementRelTo", "RelativePlacement"],
        &[inv("PlacesObject", "IfcProduct", "ObjectPlacement")],
    ),
    def(
        "IfcGeometricRepresentationContext",
        None,
        &[
            "ContextIdentifier",
            "ContextType",
            "CoordinateSpaceDimension",
            "Precision",
            "WorldCoordinateSystem",
            "TrueNorth",
        ],
        NONE,
    ),
    def(
        "IfcProductDefinitionShape",
        None,
        &["Name", "Description", "Representations"],
        &[inv("ShapeOfProduct", "IfcProduct", "Representation")],
    ),
    def(
        "IfcShapeRepresentation",
        None,
        &["ContextOfItems", "RepresentationIdentifier", "RepresentationType", "Items"],
        NONE,
    ),
    def(
        "IfcExtrudedAreaSolid",
        None,
        &["SweptArea", "Position", "ExtrudedDirection", "Depth"],
        NONE,
    ),
    def(
        "IfcRectangleProfileDef",
        None,
        &["ProfileType", "ProfileName", "Position", "XDim", "YDim"],
        NONE,
    ),
    def("IfcUnitAssignment", None, &["Units"], NONE),
    def("IfcSIUnit", None, &["Dimensions", "UnitType", "Prefix", "Name"], NONE),
    def(
        "IfcMaterial",
        None,
        &["Name", "Description", "Category"],
        &[inv("AssociatedTo", "IfcRelAssociatesMaterial", "RelatingMaterial")],
    ),
    def(
        "IfcPostalAddress",
        None,
        &[
            "Purpose",
            "Description",
            "UserDefinedPurpose",
            "InternalLocation",
            "AddressLines",
            "PostalBox",
            "Town",
            "Region",
            "PostalCode",
            "Country",
        ],
        NONE,
    ),
];

/// Lookup structure over the built-in definitions, keyed by upper-case
/// type name.
#[derive(Debug)]
pub struct Schema {
    by_upper: HashMap<String, &'static EntityDef>,
}

impl Schema {
    /// The process-wide built-in schema.
    pub fn builtin() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema {
            by_upper: DEFINITIONS
                .iter()
                .map(|d| (d.name.to_ascii_uppercase(), d))
                .collect(),
        })
    }

    pub fn get(&self, type_name: &str) -> Option<&'static EntityDef> {
        self.by_upper.get(&type_name.to_ascii_uppercase()).copied()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.get(type_name).is_some()
    }

    /// Declared spelling of a type keyword (`IFCWALL` -> `IfcWall`).
    pub fn canonical_name<'a>(&self, keyword: &'a str) -> &'a str {
        match self.get(keyword) {
            Some(d) => d.name,
            None => keyword,
        }
    }

    /// The type followed by its supertypes, most specific first.
    pub fn lineage(&self, type_name: &str) -> Vec<&'static EntityDef> {
        let mut chain = Vec::new();
        let mut current = self.get(type_name);
        while let Some(d) = current {
            chain.push(d);
            current = d.supertype.and_then(|s| self.get(s));
        }
        chain
    }

    /// Explicit attribute names in positional order, inherited first.
    pub fn attribute_names(&self, type_name: &str) -> Vec<&'static str> {
        self.lineage(type_name)
            .iter()
            .rev()
            .flat_map(|d| d.attributes.iter().copied())
            .collect()
    }

    /// Inverse declarations, inherited first. A redeclared name keeps the
    /// most specific definition at the inherited position.
    pub fn inverse_attributes(&self, type_name: &str) -> Vec<InverseDef> {
        let mut out: Vec<InverseDef> = Vec::new();
        for d in self.lineage(type_name).iter().rev() {
            for inverse in d.inverses {
                match out.iter_mut().find(|i| i.name == inverse.name) {
                    Some(slot) => *slot = *inverse,
                    None => out.push(*inverse),
                }
            }
        }
        out
    }

    pub fn is_subtype_of(&self, type_name: &str, ancestor: &str) -> bool {
        if type_name.eq_ignore_ascii_case(ancestor) {
            return true;
        }
        self.lineage(type_name)
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(ancestor))
    }

    pub fn position_of(&self, type_name: &str, attribute: &str) -> Option<usize> {
        self.attribute_names(type_name)
            .iter()
            .position(|a| *a == attribute)
    }
}
