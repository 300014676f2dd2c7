//! IFC2X3 core subset.

use ifc_core::{ParamType, Registry, SchemaBuilder, SchemaError};

/// `FILE_SCHEMA` identifier.
pub const IFC2X3: &str = "IFC2X3";

fn named(name: &str) -> ParamType {
    ParamType::named(name)
}

fn list(name: &str) -> ParamType {
    ParamType::list_of(ParamType::named(name))
}

/// Build the IFC2X3 registry.
pub fn ifc2x3() -> Result<Registry, SchemaError> {
    let builder = Registry::builder(IFC2X3);
    let builder = defined_types(builder);
    let builder = enumerations(builder);
    let builder = selects(builder);
    let builder = actors(builder);
    let builder = kernel(builder);
    let builder = geometry(builder);
    let builder = units(builder);
    let builder = properties(builder);
    builder.build()
}

fn defined_types(b: SchemaBuilder) -> SchemaBuilder {
    b.defined("IfcGloballyUniqueId", ParamType::String)
        .defined("IfcLabel", ParamType::String)
        .defined("IfcText", ParamType::String)
        .defined("IfcIdentifier", ParamType::String)
        .defined("IfcTimeStamp", ParamType::Integer)
        .defined("IfcInteger", ParamType::Integer)
        .defined("IfcReal", ParamType::Real)
        .defined("IfcBoolean", ParamType::Boolean)
        .defined("IfcLogical", ParamType::Logical)
        .defined("IfcDimensionCount", ParamType::Integer)
        .defined("IfcLengthMeasure", ParamType::Real)
        .defined("IfcPositiveLengthMeasure", named("IfcLengthMeasure"))
        .defined("IfcAreaMeasure", ParamType::Real)
        .defined("IfcVolumeMeasure", ParamType::Real)
        .defined("IfcMassMeasure", ParamType::Real)
        .defined("IfcTimeMeasure", ParamType::Real)
        .defined("IfcPlaneAngleMeasure", ParamType::Real)
        .defined("IfcPositivePlaneAngleMeasure", named("IfcPlaneAngleMeasure"))
        .defined("IfcRatioMeasure", ParamType::Real)
        .defined("IfcPositiveRatioMeasure", named("IfcRatioMeasure"))
        .defined("IfcNumericMeasure", ParamType::Number)
        .defined("IfcCountMeasure", ParamType::Number)
}

fn enumerations(b: SchemaBuilder) -> SchemaBuilder {
    b.enumeration(
        "IfcStateEnum",
        &["READWRITE", "READONLY", "LOCKED", "READWRITELOCKED", "READONLYLOCKED"],
    )
    .enumeration(
        "IfcChangeActionEnum",
        &[
            "NOCHANGE",
            "MODIFIED",
            "ADDED",
            "DELETED",
            "MODIFIEDADDED",
            "MODIFIEDDELETED",
        ],
    )
    .enumeration(
        "IfcUnitEnum",
        &[
            "AREAUNIT",
            "LENGTHUNIT",
            "MASSUNIT",
            "PLANEANGLEUNIT",
            "SOLIDANGLEUNIT",
            "THERMODYNAMICTEMPERATUREUNIT",
            "TIMEUNIT",
            "VOLUMEUNIT",
            "USERDEFINED",
        ],
    )
    .enumeration(
        "IfcSIPrefix",
        &[
            "EXA", "PETA", "TERA", "GIGA", "MEGA", "KILO", "HECTO", "DECA", "DECI", "CENTI",
            "MILLI", "MICRO", "NANO", "PICO", "FEMTO", "ATTO",
        ],
    )
    .enumeration(
        "IfcSIUnitName",
        &[
            "AMPERE",
            "BECQUEREL",
            "CANDELA",
            "COULOMB",
            "CUBIC_METRE",
            "DEGREE_CELSIUS",
            "FARAD",
            "GRAM",
            "GRAY",
            "HENRY",
            "HERTZ",
            "JOULE",
            "KELVIN",
            "LUMEN",
            "LUX",
            "METRE",
            "MOLE",
            "NEWTON",
            "OHM",
            "PASCAL",
            "RADIAN",
            "SECOND",
            "SIEMENS",
            "SIEVERT",
            "SQUARE_METRE",
            "STERADIAN",
            "TESLA",
            "VOLT",
            "WATT",
            "WEBER",
        ],
    )
    .enumeration(
        "IfcRoleEnum",
        &[
            "SUPPLIER",
            "MANUFACTURER",
            "CONTRACTOR",
            "SUBCONTRACTOR",
            "ARCHITECT",
            "STRUCTURALENGINEER",
            "COSTENGINEER",
            "CLIENT",
            "BUILDINGOWNER",
            "BUILDINGOPERATOR",
            "MECHANICALENGINEER",
            "ELECTRICALENGINEER",
            "PROJECTMANAGER",
            "FACILITIESMANAGER",
            "CIVILENGINEER",
            "COMISSIONINGENGINEER",
            "ENGINEER",
            "OWNER",
            "CONSULTANT",
            "CONSTRUCTIONMANAGER",
            "FIELDCONSTRUCTIONMANAGER",
            "RESELLER",
            "USERDEFINED",
        ],
    )
    .enumeration(
        "IfcAddressTypeEnum",
        &["OFFICE", "SITE", "HOME", "DISTRIBUTIONPOINT", "USERDEFINED"],
    )
    .enumeration("IfcElementCompositionEnum", &["COMPLEX", "ELEMENT", "PARTIAL"])
}

fn selects(b: SchemaBuilder) -> SchemaBuilder {
    b.select(
        "IfcSimpleValue",
        &[
            "IfcInteger",
            "IfcReal",
            "IfcBoolean",
            "IfcIdentifier",
            "IfcText",
            "IfcLabel",
            "IfcLogical",
        ],
    )
    .select(
        "IfcMeasureValue",
        &[
            "IfcVolumeMeasure",
            "IfcTimeMeasure",
            "IfcPositiveRatioMeasure",
            "IfcRatioMeasure",
            "IfcPositivePlaneAngleMeasure",
            "IfcPlaneAngleMeasure",
            "IfcNumericMeasure",
            "IfcMassMeasure",
            "IfcPositiveLengthMeasure",
            "IfcLengthMeasure",
            "IfcCountMeasure",
            "IfcAreaMeasure",
        ],
    )
    .select("IfcValue", &["IfcMeasureValue", "IfcSimpleValue"])
    .select("IfcAxis2Placement", &["IfcAxis2Placement2D", "IfcAxis2Placement3D"])
    .select("IfcUnit", &["IfcNamedUnit"])
}

fn actors(b: SchemaBuilder) -> SchemaBuilder {
    b.entity(
        "IfcActorRole",
        None,
        &[
            ("Role", named("IfcRoleEnum")),
            ("UserDefinedRole", named("IfcLabel")),
            ("Description", named("IfcText")),
        ],
    )
    .abstract_entity(
        "IfcAddress",
        None,
        &[
            ("Purpose", named("IfcAddressTypeEnum")),
            ("Description", named("IfcText")),
            ("UserDefinedPurpose", named("IfcLabel")),
        ],
    )
    .entity(
        "IfcPostalAddress",
        Some("IfcAddress"),
        &[
            ("InternalLocation", named("IfcLabel")),
            ("AddressLines", list("IfcLabel")),
            ("PostalBox", named("IfcLabel")),
            ("Town", named("IfcLabel")),
            ("Region", named("IfcLabel")),
            ("PostalCode", named("IfcLabel")),
            ("Country", named("IfcLabel")),
        ],
    )
    .entity(
        "IfcPerson",
        None,
        &[
            ("Id", named("IfcIdentifier")),
            ("FamilyName", named("IfcLabel")),
            ("GivenName", named("IfcLabel")),
            ("MiddleNames", list("IfcLabel")),
            ("PrefixTitles", list("IfcLabel")),
            ("SuffixTitles", list("IfcLabel")),
            ("Roles", list("IfcActorRole")),
            ("Addresses", list("IfcAddress")),
        ],
    )
    .entity(
        "IfcOrganization",
        None,
        &[
            ("Id", named("IfcIdentifier")),
            ("Name", named("IfcLabel")),
            ("Description", named("IfcText")),
            ("Roles", list("IfcActorRole")),
            ("Addresses", list("IfcAddress")),
        ],
    )
    .entity(
        "IfcPersonAndOrganization",
        None,
        &[
            ("ThePerson", named("IfcPerson")),
            ("TheOrganization", named("IfcOrganization")),
            ("Roles", list("IfcActorRole")),
        ],
    )
    .entity(
        "IfcApplication",
        None,
        &[
            ("ApplicationDeveloper", named("IfcOrganization")),
            ("Version", named("IfcLabel")),
            ("ApplicationFullName", named("IfcLabel")),
            ("ApplicationIdentifier", named("IfcIdentifier")),
        ],
    )
    .entity(
        "IfcOwnerHistory",
        None,
        &[
            ("OwningUser", named("IfcPersonAndOrganization")),
            ("OwningApplication", named("IfcApplication")),
            ("State", named("IfcStateEnum")),
            ("ChangeAction", named("IfcChangeActionEnum")),
            ("LastModifiedDate", named("IfcTimeStamp")),
            ("LastModifyingUser", named("IfcPersonAndOrganization")),
            ("LastModifyingApplication", named("IfcApplication")),
            ("CreationDate", named("IfcTimeStamp")),
        ],
    )
}

fn kernel(b: SchemaBuilder) -> SchemaBuilder {
    b.abstract_entity(
        "IfcRoot",
        None,
        &[
            ("GlobalId", named("IfcGloballyUniqueId")),
            ("OwnerHistory", named("IfcOwnerHistory")),
            ("Name", named("IfcLabel")),
            ("Description", named("IfcText")),
        ],
    )
    .abstract_entity("IfcObjectDefinition", Some("IfcRoot"), &[])
    .abstract_entity(
        "IfcObject",
        Some("IfcObjectDefinition"),
        &[("ObjectType", named("IfcLabel"))],
    )
    .entity(
        "IfcProject",
        Some("IfcObject"),
        &[
            ("LongName", named("IfcLabel")),
            ("Phase", named("IfcLabel")),
            ("RepresentationContexts", list("IfcRepresentationContext")),
            ("UnitsInContext", named("IfcUnitAssignment")),
        ],
    )
    .abstract_entity(
        "IfcProduct",
        Some("IfcObject"),
        &[
            ("ObjectPlacement", named("IfcObjectPlacement")),
            ("Representation", named("IfcProductRepresentation")),
        ],
    )
    .abstract_entity(
        "IfcSpatialStructureElement",
        Some("IfcProduct"),
        &[
            ("LongName", named("IfcLabel")),
            ("CompositionType", named("IfcElementCompositionEnum")),
        ],
    )
    .entity(
        "IfcBuildingStorey",
        Some("IfcSpatialStructureElement"),
        &[("Elevation", named("IfcLengthMeasure"))],
    )
    .abstract_entity(
        "IfcElement",
        Some("IfcProduct"),
        &[("Tag", named("IfcIdentifier"))],
    )
    .abstract_entity("IfcBuildingElement", Some("IfcElement"), &[])
    .entity("IfcWall", Some("IfcBuildingElement"), &[])
    .entity("IfcWallStandardCase", Some("IfcWall"), &[])
    .abstract_entity("IfcRelationship", Some("IfcRoot"), &[])
    .abstract_entity(
        "IfcRelDecomposes",
        Some("IfcRelationship"),
        &[
            ("RelatingObject", named("IfcObjectDefinition")),
            ("RelatedObjects", list("IfcObjectDefinition")),
        ],
    )
    .entity("IfcRelAggregates", Some("IfcRelDecomposes"), &[])
    .abstract_entity("IfcRelConnects", Some("IfcRelationship"), &[])
    .entity(
        "IfcRelContainedInSpatialStructure",
        Some("IfcRelConnects"),
        &[
            ("RelatedElements", list("IfcProduct")),
            ("RelatingStructure", named("IfcSpatialStructureElement")),
        ],
    )
    .abstract_entity(
        "IfcRelDefines",
        Some("IfcRelationship"),
        &[("RelatedObjects", list("IfcObject"))],
    )
    .entity(
        "IfcRelDefinesByProperties",
        Some("IfcRelDefines"),
        &[("RelatingPropertyDefinition", named("IfcPropertySetDefinition"))],
    )
}

fn geometry(b: SchemaBuilder) -> SchemaBuilder {
    b.abstract_entity("IfcRepresentationItem", None, &[])
        .abstract_entity(
            "IfcGeometricRepresentationItem",
            Some("IfcRepresentationItem"),
            &[],
        )
        .abstract_entity("IfcPoint", Some("IfcGeometricRepresentationItem"), &[])
        .entity(
            "IfcCartesianPoint",
            Some("IfcPoint"),
            &[("Coordinates", list("IfcLengthMeasure"))],
        )
        .entity(
            "IfcDirection",
            Some("IfcGeometricRepresentationItem"),
            &[("DirectionRatios", ParamType::list_of(ParamType::Real))],
        )
        .abstract_entity(
            "IfcPlacement",
            Some("IfcGeometricRepresentationItem"),
            &[("Location", named("IfcCartesianPoint"))],
        )
        .entity(
            "IfcAxis2Placement2D",
            Some("IfcPlacement"),
            &[("RefDirection", named("IfcDirection"))],
        )
        .entity(
            "IfcAxis2Placement3D",
            Some("IfcPlacement"),
            &[
                ("Axis", named("IfcDirection")),
                ("RefDirection", named("IfcDirection")),
            ],
        )
        .abstract_entity("IfcObjectPlacement", None, &[])
        .entity(
            "IfcLocalPlacement",
            Some("IfcObjectPlacement"),
            &[
                ("PlacementRelTo", named("IfcObjectPlacement")),
                ("RelativePlacement", named("IfcAxis2Placement")),
            ],
        )
        .entity(
            "IfcRepresentationContext",
            None,
            &[
                ("ContextIdentifier", named("IfcLabel")),
                ("ContextType", named("IfcLabel")),
            ],
        )
        .entity(
            "IfcGeometricRepresentationContext",
            Some("IfcRepresentationContext"),
            &[
                ("CoordinateSpaceDimension", named("IfcDimensionCount")),
                ("Precision", ParamType::Real),
                ("WorldCoordinateSystem", named("IfcAxis2Placement")),
                ("TrueNorth", named("IfcDirection")),
            ],
        )
        .entity(
            "IfcRepresentation",
            None,
            &[
                ("ContextOfItems", named("IfcRepresentationContext")),
                ("RepresentationIdentifier", named("IfcLabel")),
                ("RepresentationType", named("IfcLabel")),
                ("Items", list("IfcRepresentationItem")),
            ],
        )
        .abstract_entity("IfcShapeModel", Some("IfcRepresentation"), &[])
        .entity("IfcShapeRepresentation", Some("IfcShapeModel"), &[])
        .entity(
            "IfcProductRepresentation",
            None,
            &[
                ("Name", named("IfcLabel")),
                ("Description", named("IfcText")),
                ("Representations", list("IfcRepresentation")),
            ],
        )
        .entity(
            "IfcProductDefinitionShape",
            Some("IfcProductRepresentation"),
            &[],
        )
}

fn units(b: SchemaBuilder) -> SchemaBuilder {
    b.entity(
        "IfcDimensionalExponents",
        None,
        &[
            ("LengthExponent", ParamType::Integer),
            ("MassExponent", ParamType::Integer),
            ("TimeExponent", ParamType::Integer),
            ("ElectricCurrentExponent", ParamType::Integer),
            ("ThermodynamicTemperatureExponent", ParamType::Integer),
            ("AmountOfSubstanceExponent", ParamType::Integer),
            ("LuminousIntensityExponent", ParamType::Integer),
        ],
    )
    .abstract_entity(
        "IfcNamedUnit",
        None,
        &[
            ("Dimensions", named("IfcDimensionalExponents")),
            ("UnitType", named("IfcUnitEnum")),
        ],
    )
    .entity(
        "IfcSIUnit",
        Some("IfcNamedUnit"),
        &[
            ("Prefix", named("IfcSIPrefix")),
            ("Name", named("IfcSIUnitName")),
        ],
    )
    .entity("IfcUnitAssignment", None, &[("Units", list("IfcUnit"))])
}

fn properties(b: SchemaBuilder) -> SchemaBuilder {
    b.abstract_entity(
        "IfcProperty",
        None,
        &[
            ("Name", named("IfcIdentifier")),
            ("Description", named("IfcText")),
        ],
    )
    .abstract_entity("IfcSimpleProperty", Some("IfcProperty"), &[])
    .entity(
        "IfcPropertySingleValue",
        Some("IfcSimpleProperty"),
        &[
            ("NominalValue", named("IfcValue")),
            ("Unit", named("IfcUnit")),
        ],
    )
    .abstract_entity("IfcPropertyDefinition", Some("IfcRoot"), &[])
    .abstract_entity("IfcPropertySetDefinition", Some("IfcPropertyDefinition"), &[])
    .entity(
        "IfcPropertySet",
        Some("IfcPropertySetDefinition"),
        &[("HasProperties", list("IfcProperty"))],
    )
}
